use async_trait::async_trait;
use serde_json::Value;

use super::donations_model::{Donation, IngestOutcome};
use crate::errors::Result;

/// Trait for webhook ingestion and donation reads
#[async_trait]
pub trait DonationServiceTrait: Send + Sync {
    /// Authenticates, deduplicates and fans a raw provider payload out to the
    /// queue, history, leaderboard and change counter.
    async fn ingest(&self, raw_payload: &Value, provided_token: Option<&str>)
        -> Result<IngestOutcome>;
    /// Most recent accepted donation.
    async fn latest(&self) -> Result<Option<Donation>>;
    async fn history(&self, limit: usize) -> Result<Vec<Donation>>;
}
