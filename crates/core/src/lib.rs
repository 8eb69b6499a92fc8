//! Tipstream Core - Domain entities, services, and traits.
//!
//! This crate contains the donation pipeline logic: payload normalization,
//! idempotent ingestion, the bounded delivery queue, the change counter and
//! the leaderboard. It is store-agnostic and written once against the
//! [`store::KeyValueStore`] trait, which the `storage-sqlite` crate implements.

pub mod constants;
pub mod donations;
pub mod errors;
pub mod leaderboard;
pub mod notifier;
pub mod queue;
pub mod store;
pub mod tokens;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
