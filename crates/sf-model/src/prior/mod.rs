//! Prior plugins: post-hoc constraints on combined parameters.

mod threshold;

pub use self::threshold::BoundedHardThreshold;
