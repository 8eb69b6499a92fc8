use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{error, info};
use serde_json::Value;

use super::donations_model::{Donation, IngestOutcome};
use super::donations_traits::DonationServiceTrait;
use super::normalizer::normalize_value;
use crate::constants::{
    dedup_marker_key, COUNTER_KEY, DEDUP_TTL, HISTORY_KEY, LATEST_DONATION_KEY, LEADERBOARD_KEY,
    QUEUE_KEY,
};
use crate::errors::{Error, Result};
use crate::leaderboard::LeaderboardServiceTrait;
use crate::notifier::ChangeNotifierTrait;
use crate::queue::{HistoryServiceTrait, QueueServiceTrait};
use crate::store::{get_typed, set_typed, KeyValueStore};
use crate::tokens::verify_shared_secret;

/// Webhook ingestion.
///
/// Duplicates are detected with a per-external-id marker written through the
/// store's atomic `set_if_absent`, so a retried webhook inside the dedup window
/// is a no-op. The fan-out after the marker is not transactional: a failure
/// part-way is logged and surfaced, never rolled back.
pub struct DonationService {
    store: Arc<dyn KeyValueStore>,
    queue: Arc<dyn QueueServiceTrait>,
    history: Arc<dyn HistoryServiceTrait>,
    leaderboard: Arc<dyn LeaderboardServiceTrait>,
    notifier: Arc<dyn ChangeNotifierTrait>,
    webhook_token: Option<String>,
}

impl DonationService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        queue: Arc<dyn QueueServiceTrait>,
        history: Arc<dyn HistoryServiceTrait>,
        leaderboard: Arc<dyn LeaderboardServiceTrait>,
        notifier: Arc<dyn ChangeNotifierTrait>,
        webhook_token: Option<String>,
    ) -> Self {
        DonationService {
            store,
            queue,
            history,
            leaderboard,
            notifier,
            webhook_token,
        }
    }

    async fn fan_out(&self, donation: &Donation) -> Result<(usize, u64)> {
        let queue_position = self
            .queue
            .enqueue(donation)
            .await
            .map_err(|e| partial_failure("enqueue", QUEUE_KEY, donation, e))?;

        set_typed(self.store.as_ref(), LATEST_DONATION_KEY, donation, None)
            .await
            .map_err(|e| partial_failure("set latest", LATEST_DONATION_KEY, donation, e))?;

        self.history
            .record(donation)
            .await
            .map_err(|e| partial_failure("record history", HISTORY_KEY, donation, e))?;

        if donation.amount > 0 {
            self.leaderboard
                .increment(&donation.donor_name, donation.amount)
                .await
                .map_err(|e| partial_failure("leaderboard increment", LEADERBOARD_KEY, donation, e))?;
        } else {
            info!(
                "Donation {} carries no amount, leaderboard unchanged",
                donation.id
            );
        }

        let counter = self
            .notifier
            .increment()
            .await
            .map_err(|e| partial_failure("counter increment", COUNTER_KEY, donation, e))?;

        Ok((queue_position, counter))
    }
}

fn partial_failure(operation: &str, key: &str, donation: &Donation, err: Error) -> Error {
    error!(
        "Partial ingestion of {}: {} on '{}' failed: {}",
        donation.id, operation, key, err
    );
    err
}

#[async_trait]
impl DonationServiceTrait for DonationService {
    async fn ingest(
        &self,
        raw_payload: &Value,
        provided_token: Option<&str>,
    ) -> Result<IngestOutcome> {
        verify_shared_secret("WEBHOOK_TOKEN", self.webhook_token.as_deref(), provided_token)?;

        let donation = normalize_value(raw_payload, Utc::now());
        let marker_key = dedup_marker_key(&donation.external_id);
        let marker = serde_json::to_value(&donation)?;

        if !self
            .store
            .set_if_absent(&marker_key, marker, Some(DEDUP_TTL))
            .await?
        {
            info!("Skipping duplicate donation {}", donation.external_id);
            return Ok(IngestOutcome::Duplicate {
                external_id: donation.external_id,
            });
        }

        let (queue_position, notification_counter) = self.fan_out(&donation).await?;
        info!(
            "Accepted donation {} from '{}' amount={} queue={} counter={}",
            donation.id, donation.donor_name, donation.amount, queue_position, notification_counter
        );

        Ok(IngestOutcome::Accepted {
            donation,
            queue_position,
            notification_counter,
        })
    }

    async fn latest(&self) -> Result<Option<Donation>> {
        get_typed(self.store.as_ref(), LATEST_DONATION_KEY).await
    }

    async fn history(&self, limit: usize) -> Result<Vec<Donation>> {
        self.history.recent(limit).await
    }
}
