//! SQLite storage implementation for Tipstream.
//!
//! This crate provides the durable [`tipstream_core::store::KeyValueStore`]
//! backend using Diesel ORM with SQLite. It contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The single-writer actor that serializes every mutation
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The core crate is database-agnostic and works against the store trait.
//!
//! ```text
//!        core (pipeline)
//!               │
//!               ▼
//!   storage-sqlite (this crate)
//!               │
//!               ▼
//!           SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod kv;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use kv::SqliteStore;

// Re-export from tipstream-core for convenience
pub use tipstream_core::errors::{Error, Result, StoreError};
