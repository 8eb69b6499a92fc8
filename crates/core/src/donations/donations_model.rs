//! Donation domain models.

use serde::{Deserialize, Serialize};

/// A normalized donation event.
///
/// `id` combines the provider's external id with the ingestion timestamp and
/// never changes once assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Donation {
    pub id: String,
    pub external_id: String,
    pub donor_name: String,
    /// Minor currency unit, never negative.
    pub amount: i64,
    pub message: String,
    /// Unix seconds.
    pub received_at: i64,
}

/// Outcome of a webhook ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted {
        donation: Donation,
        queue_position: usize,
        notification_counter: u64,
    },
    /// The external id was already seen inside the dedup window.
    Duplicate { external_id: String },
}

impl IngestOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, IngestOutcome::Duplicate { .. })
    }
}
