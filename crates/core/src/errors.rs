//! Core error types for the donation pipeline.
//!
//! This module defines store-agnostic error types. Adapter-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the pipeline.
///
/// Callers map these onto transport status codes; the messages never contain
/// secret material.
#[derive(Error, Debug)]
pub enum Error {
    /// The shared secret was missing or did not match.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required secret or backend setting is absent. Deployment error.
    #[error("Server misconfigured: {0}")]
    Unconfigured(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Store-agnostic error type for key-value operations.
///
/// Uses `String` for all details so adapters can convert their own error
/// types into this format.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or a connection could not be acquired.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A command against the backend failed.
    #[error("Store command failed on '{key}': {message}")]
    CommandFailed { key: String, message: String },

    /// A stored value did not have the expected shape.
    #[error("Corrupt value at '{key}': {message}")]
    CorruptValue { key: String, message: String },

    /// Internal/unexpected adapter error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Validation errors for caller input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ValidationError {
    /// Name of the offending field, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField(field) => Some(field),
            ValidationError::InvalidAmount(_) => Some("amount"),
            ValidationError::InvalidInput(_) => None,
        }
    }
}
