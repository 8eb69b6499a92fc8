use std::collections::HashSet;

use async_trait::async_trait;

use super::queue_model::AckResult;
use crate::donations::Donation;
use crate::errors::Result;

/// Bounded FIFO of undelivered donations.
#[async_trait]
pub trait QueueServiceTrait: Send + Sync {
    /// Appends at the tail and returns the new length.
    async fn enqueue(&self, donation: &Donation) -> Result<usize>;
    /// Removes entries whose id or external id is in `ids`.
    async fn acknowledge(&self, ids: &HashSet<String>) -> Result<AckResult>;
    async fn peek_all(&self) -> Result<Vec<Donation>>;
}

/// Bounded most-recent-first audit history, independent of the queue.
#[async_trait]
pub trait HistoryServiceTrait: Send + Sync {
    async fn record(&self, donation: &Donation) -> Result<usize>;
    async fn recent(&self, limit: usize) -> Result<Vec<Donation>>;
}
