use async_trait::async_trait;

use super::leaderboard_model::{
    IncrementResult, LeaderboardEditRecord, LeaderboardEntry, MigrationReport, RenameOutcome,
    WriteResult,
};
use crate::errors::Result;

/// Trait for leaderboard aggregation operations
#[async_trait]
pub trait LeaderboardServiceTrait: Send + Sync {
    /// Adds a positive amount to a donor's total. Does not touch the change counter.
    async fn increment(&self, name: &str, amount: i64) -> Result<IncrementResult>;
    /// Administrative additive write; bumps the change counter once.
    async fn write(&self, name: &str, amount: i64) -> Result<WriteResult>;
    async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>>;
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<RenameOutcome>;
    async fn edit_history(&self, limit: usize) -> Result<Vec<LeaderboardEditRecord>>;
    async fn migrate_legacy(&self) -> Result<MigrationReport>;
}
