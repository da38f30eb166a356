//! # sf-model
//!
//! Mixture models for stream-membership likelihoods.
//!
//! This crate provides:
//! - [`MixtureModel`]: log-sum-exp composition of named component models,
//!   with prefix-addressed parameter delegation and an ordered prior-plugin
//!   chain.
//! - Built-in leaf components: [`ExponentialBackground`] and
//!   [`NormalStream`].
//! - [`BoundedHardThreshold`]: a dual-mode prior plugin suppressing a
//!   component below a weight cutoff inside a coordinate window.
//! - Scalar log-density kernels in [`stats`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod mixture;
pub mod prior;
pub mod stats;

pub use builtin::{CoordSpec, ExponentialBackground, NormalStream};
pub use mixture::MixtureModel;
pub use prior::BoundedHardThreshold;
