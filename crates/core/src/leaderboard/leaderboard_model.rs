//! Leaderboard domain models.

use serde::{Deserialize, Serialize};

/// Accumulated total for one donor name (exact, case-sensitive match).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    #[serde(rename = "name")]
    pub donor_name: String,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncrementResult {
    pub previous_total: i64,
    pub new_total: i64,
}

/// Result of a direct administrative write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteResult {
    pub is_new: bool,
    pub existing_total: i64,
    pub final_total: i64,
    pub notification_counter: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenameAction {
    Renamed,
    Merged,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameOutcome {
    pub action: RenameAction,
    pub old_total: i64,
    pub existing_total: i64,
    pub final_total: i64,
}

/// Audit record appended for every successful rename or merge. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEditRecord {
    pub old_name: String,
    pub new_name: String,
    pub old_total: i64,
    pub new_total: i64,
    pub merged: bool,
    /// Unix seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigrationFailure {
    pub key: String,
    pub error: String,
}

/// Outcome of folding legacy per-donor keys into the sorted leaderboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
    pub total_old_keys: usize,
    pub errors: Vec<MigrationFailure>,
}
