use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{error, info, warn};

use super::leaderboard_model::{
    IncrementResult, LeaderboardEditRecord, LeaderboardEntry, MigrationFailure, MigrationReport,
    RenameAction, RenameOutcome, WriteResult,
};
use super::leaderboard_traits::LeaderboardServiceTrait;
use crate::constants::{EDIT_LOG_KEY, EDIT_LOG_MAX, LEADERBOARD_KEY, LEGACY_LEADERBOARD_PREFIX};
use crate::errors::{Error, Result, ValidationError};
use crate::notifier::ChangeNotifierTrait;
use crate::store::{get_typed, set_typed, value_as_i64, KeyValueStore};

/// Per-donor accumulator kept in one sorted set.
///
/// Score additions use the store's atomic `zincrby`. The edit log is a whole
/// value rewritten on each rename, so concurrent renames race last-writer-wins
/// on the log only.
pub struct LeaderboardService {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn ChangeNotifierTrait>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn ChangeNotifierTrait>) -> Self {
        LeaderboardService { store, notifier }
    }

    async fn append_edit(&self, record: LeaderboardEditRecord) -> Result<()> {
        let mut log = get_typed::<Vec<LeaderboardEditRecord>>(self.store.as_ref(), EDIT_LOG_KEY)
            .await?
            .unwrap_or_default();
        log.insert(0, record);
        log.truncate(EDIT_LOG_MAX);
        set_typed(self.store.as_ref(), EDIT_LOG_KEY, &log, None).await
    }

    async fn positive_score(&self, name: &str) -> Result<i64> {
        Ok(self
            .store
            .zscore(LEADERBOARD_KEY, name)
            .await?
            .filter(|total| *total > 0)
            .unwrap_or(0))
    }
}

fn require_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()).into());
    }
    Ok(())
}

fn require_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(ValidationError::InvalidAmount(format!("{} is not positive", amount)).into());
    }
    Ok(())
}

#[async_trait]
impl LeaderboardServiceTrait for LeaderboardService {
    async fn increment(&self, name: &str, amount: i64) -> Result<IncrementResult> {
        require_name("name", name)?;
        require_positive(amount)?;
        let new_total = self.store.zincrby(LEADERBOARD_KEY, name, amount).await?;
        Ok(IncrementResult {
            previous_total: new_total - amount,
            new_total,
        })
    }

    async fn write(&self, name: &str, amount: i64) -> Result<WriteResult> {
        let result = self.increment(name, amount).await?;
        let notification_counter = self.notifier.increment().await.map_err(|e| {
            error!(
                "Leaderboard write for '{}' applied but counter increment failed: {}",
                name, e
            );
            e
        })?;
        info!(
            "Leaderboard write '{}' +{} -> {}",
            name, amount, result.new_total
        );
        Ok(WriteResult {
            is_new: result.previous_total <= 0,
            existing_total: result.previous_total,
            final_total: result.new_total,
            notification_counter,
        })
    }

    async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        let ranked = self.store.zrange_rev(LEADERBOARD_KEY, n).await?;
        Ok(ranked
            .into_iter()
            .filter(|(_, total)| *total > 0)
            .map(|(donor_name, total)| LeaderboardEntry { donor_name, total })
            .collect())
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<RenameOutcome> {
        require_name("old_name", old_name)?;
        require_name("new_name", new_name)?;
        if old_name == new_name {
            return Err(ValidationError::InvalidInput(
                "old_name and new_name must differ".to_string(),
            )
            .into());
        }

        let old_total = self.positive_score(old_name).await?;
        if old_total == 0 {
            return Err(Error::NotFound(format!(
                "No leaderboard balance for '{}'",
                old_name
            )));
        }
        let existing_total = self.positive_score(new_name).await?;
        let action = if existing_total > 0 {
            RenameAction::Merged
        } else {
            RenameAction::Renamed
        };

        let final_total = self
            .store
            .zincrby(LEADERBOARD_KEY, new_name, old_total)
            .await?;
        // Subtract rather than delete so increments to old_name that land
        // mid-rename survive on it.
        let remainder = self
            .store
            .zincrby(LEADERBOARD_KEY, old_name, -old_total)
            .await?;
        if remainder == 0 {
            self.store
                .zrem_if_score(LEADERBOARD_KEY, old_name, 0)
                .await?;
        } else {
            warn!(
                "'{}' kept {} donated during rename to '{}'",
                old_name, remainder, new_name
            );
        }

        let record = LeaderboardEditRecord {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            old_total,
            new_total: final_total,
            merged: action == RenameAction::Merged,
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self.append_edit(record).await {
            error!(
                "Rename '{}' -> '{}' applied but edit log append on '{}' failed: {}",
                old_name, new_name, EDIT_LOG_KEY, e
            );
            return Err(e);
        }
        self.notifier.increment().await?;

        info!(
            "Leaderboard {:?} '{}' ({}) -> '{}' ({}), final {}",
            action, old_name, old_total, new_name, existing_total, final_total
        );
        Ok(RenameOutcome {
            action,
            old_total,
            existing_total,
            final_total,
        })
    }

    async fn edit_history(&self, limit: usize) -> Result<Vec<LeaderboardEditRecord>> {
        let mut log = get_typed::<Vec<LeaderboardEditRecord>>(self.store.as_ref(), EDIT_LOG_KEY)
            .await?
            .unwrap_or_default();
        log.truncate(limit);
        Ok(log)
    }

    async fn migrate_legacy(&self) -> Result<MigrationReport> {
        let keys = self.store.scan_prefix(LEGACY_LEADERBOARD_PREFIX).await?;
        info!("Found {} legacy leaderboard keys", keys.len());

        let mut report = MigrationReport {
            total_old_keys: keys.len(),
            ..MigrationReport::default()
        };

        for key in keys {
            let name = key.trim_start_matches(LEGACY_LEADERBOARD_PREFIX);
            let step: Result<bool> = async {
                let total = match self.store.get(&key).await? {
                    Some(value) => value_as_i64(&key, &value)?,
                    None => 0,
                };
                let moved = total > 0 && !name.is_empty();
                if moved {
                    self.store.zincrby(LEADERBOARD_KEY, name, total).await?;
                }
                self.store.delete(&key).await?;
                Ok(moved)
            }
            .await;

            match step {
                Ok(true) => report.migrated += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to migrate '{}': {}", key, e);
                    report.errors.push(MigrationFailure {
                        key: key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.migrated > 0 {
            self.notifier.increment().await?;
        }
        info!(
            "Legacy migration done: {} migrated, {} errors",
            report.migrated,
            report.errors.len()
        );
        Ok(report)
    }
}
