//! Storage-specific error types for SQLite operations.
//!
//! This module provides error types that wrap Diesel-specific errors and convert
//! them to the store-agnostic error types defined in `tipstream_core`.

use diesel::result::Error as DieselError;
use thiserror::Error;
use tipstream_core::errors::{Error, StoreError as CoreStoreError};

/// Storage-specific errors that wrap Diesel and r2d2 types.
///
/// These errors are internal to the storage layer and are converted to
/// `tipstream_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A core error raised inside a write job. Passed through untouched.
    #[error("{0}")]
    Core(Error),
}

/// Convert core Error to StorageError (for write_actor transaction wrapper)
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::Core(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let store_err = match err {
            StorageError::ConnectionFailed(e) => CoreStoreError::Unavailable(e.to_string()),
            StorageError::PoolError(e) => CoreStoreError::Unavailable(e.to_string()),
            StorageError::Io(e) => CoreStoreError::Unavailable(e.to_string()),
            StorageError::QueryFailed(e) => CoreStoreError::CommandFailed {
                key: String::new(),
                message: e.to_string(),
            },
            StorageError::MigrationFailed(e) => CoreStoreError::Internal(e),
            StorageError::Core(e) => return e,
        };
        Error::Store(store_err)
    }
}

/// Extension trait for converting Diesel results to core results with the
/// store key the failing command touched.
pub trait IntoCore<T> {
    fn into_core(self, key: &str) -> tipstream_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self, key: &str) -> tipstream_core::Result<T> {
        self.map_err(|e| {
            Error::Store(CoreStoreError::CommandFailed {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
    }
}
