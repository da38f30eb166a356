//! # sf-core
//!
//! Core contracts for streamfit, a mixture-model framework for stream
//! membership likelihoods.
//!
//! This crate provides:
//! - An [`array::ArrayNamespace`] capability trait with CPU and `nalgebra`
//!   backends, keeping model logic backend-agnostic.
//! - A columnar [`data::Data`] table and a byte-format ingestion registry.
//! - The immutable [`params::Params`] container with prefix-addressable keys,
//!   plus construction-time metadata (`ParamNames` / `ParamBounds` /
//!   `ParamScalers`).
//! - The probability protocol ([`prob`]) and the model / generator / prior
//!   plugin seams ([`traits`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod data;
pub mod error;
pub mod params;
pub mod prob;
pub mod traits;

pub use array::{ArrayNamespace, CpuBackend, NalgebraBackend};
pub use data::{Data, FormatRegistry, IngestOptions};
pub use error::{Error, Result};
pub use params::{
    ClosedBounds, FlatKey, ParamBounds, ParamNameDecl, ParamNames, ParamScaler, ParamScalers,
    Params, ParamsBuilder,
};
pub use prob::{LnProbability, Probability, TotalLnProbability, TotalProbability};
pub use traits::{ConstantGenerator, Model, ParamGenerator, PriorPlugin};
