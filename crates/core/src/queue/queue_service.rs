use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use super::queue_model::AckResult;
use super::queue_traits::{HistoryServiceTrait, QueueServiceTrait};
use crate::constants::{DEDUP_TTL, HISTORY_KEY, HISTORY_MAX, QUEUE_KEY, QUEUE_MAX};
use crate::donations::Donation;
use crate::errors::{Result, ValidationError};
use crate::store::{get_typed, set_typed, KeyValueStore};

/// Queue of donations awaiting consumer pickup.
///
/// The whole queue is one store value rewritten on every change. Concurrent
/// writers race with last-writer-wins; acknowledgement is idempotent, and the
/// leaderboard keeps the durable totals.
pub struct QueueService {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl QueueService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_capacity(store, QUEUE_MAX)
    }

    pub fn with_capacity(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        QueueService { store, capacity }
    }

    async fn load(&self) -> Result<Vec<Donation>> {
        Ok(get_typed::<Vec<Donation>>(self.store.as_ref(), QUEUE_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, queue: &[Donation]) -> Result<()> {
        set_typed(self.store.as_ref(), QUEUE_KEY, queue, Some(DEDUP_TTL)).await
    }
}

#[async_trait]
impl QueueServiceTrait for QueueService {
    async fn enqueue(&self, donation: &Donation) -> Result<usize> {
        let mut queue = self.load().await?;
        queue.push(donation.clone());
        if queue.len() > self.capacity {
            let overflow = queue.len() - self.capacity;
            queue.drain(..overflow);
            debug!("Queue over capacity, evicted {} oldest entries", overflow);
        }
        self.save(&queue).await?;
        Ok(queue.len())
    }

    async fn acknowledge(&self, ids: &HashSet<String>) -> Result<AckResult> {
        if ids.is_empty() {
            return Err(ValidationError::MissingField("processed_ids".to_string()).into());
        }
        let mut queue = self.load().await?;
        let before = queue.len();
        queue.retain(|d| !ids.contains(&d.id) && !ids.contains(&d.external_id));
        let removed = before - queue.len();
        if removed > 0 {
            self.save(&queue).await?;
        }
        info!(
            "Acknowledged {} of {} ids, {} remaining",
            removed,
            ids.len(),
            queue.len()
        );
        Ok(AckResult {
            removed,
            remaining: queue.len(),
        })
    }

    async fn peek_all(&self) -> Result<Vec<Donation>> {
        self.load().await
    }
}

/// Most-recent-first ring of ingested donations.
pub struct HistoryService {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl HistoryService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_capacity(store, HISTORY_MAX)
    }

    pub fn with_capacity(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        HistoryService { store, capacity }
    }
}

#[async_trait]
impl HistoryServiceTrait for HistoryService {
    async fn record(&self, donation: &Donation) -> Result<usize> {
        let mut history = get_typed::<Vec<Donation>>(self.store.as_ref(), HISTORY_KEY)
            .await?
            .unwrap_or_default();
        history.insert(0, donation.clone());
        history.truncate(self.capacity);
        set_typed(self.store.as_ref(), HISTORY_KEY, &history, Some(DEDUP_TTL)).await?;
        Ok(history.len())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Donation>> {
        let mut history = get_typed::<Vec<Donation>>(self.store.as_ref(), HISTORY_KEY)
            .await?
            .unwrap_or_default();
        history.truncate(limit);
        Ok(history)
    }
}
