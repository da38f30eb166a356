//! Error types for streamfit

use thiserror::Error;

/// streamfit error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Lookup of an undeclared parameter or column
    #[error("key lookup error: {0}")]
    KeyLookup(String),

    /// Unknown data format tag at the registry boundary
    #[error("unknown data format: {0}")]
    UnknownFormat(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
