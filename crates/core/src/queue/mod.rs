//! Queue module - bounded delivery queue and audit history.

mod queue_model;
mod queue_service;
mod queue_traits;

#[cfg(test)]
mod queue_service_tests;

pub use queue_model::AckResult;
pub use queue_service::{HistoryService, QueueService};
pub use queue_traits::{HistoryServiceTrait, QueueServiceTrait};
