//! Error types for the gridbin crate.
//!
//! This module defines a comprehensive error enum that covers all failure
//! conditions raised by the binning core. Programming-contract violations
//! (vector-layout mismatches, advancing an exhausted cursor) are not
//! represented here; those panic at the violating call site.

use thiserror::Error;

/// The main error type for gridbin operations.
#[derive(Error, Debug)]
pub enum GridbinError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A variable name referenced by an aggregator configuration that is
    /// not part of the variable context
    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Truncated or otherwise undecodable bin payloads
    #[error("Bin decode error: {message}")]
    Decode { message: String },
}

/// Convenience type alias for Results with GridbinError
pub type Result<T> = std::result::Result<T, GridbinError>;
