//! Error types for growth operations.
//!
//! This module defines [`GrowthError`] which covers the failures that abort an
//! operation. Dirty input data (unreadable lines, unknown submissions) is never
//! reported through this type; it is counted in the diagnostic reports instead.

use thiserror::Error;

/// Errors that can occur while building or reading a growth time series.
#[derive(Error, Debug)]
pub enum GrowthError {
    /// Filesystem errors (missing input files, unwritable output, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a value that the caller required to be well formed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with a time-series store backend.
    #[error("Store error: {0}")]
    Store(String),

    /// An invalid argument was provided. This indicates a defect in the caller.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The run configuration is incomplete or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error serializing output rows.
    #[error("Export error: {0}")]
    Export(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`GrowthError`].
pub type Result<T> = std::result::Result<T, GrowthError>;
