use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use tipstream_core::donations as core_donations;
use tipstream_core::leaderboard as core_leaderboard;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct Donation {
    pub id: String,
    pub external_id: String,
    pub donor_name: String,
    pub amount: i64,
    pub message: String,
    pub received_at: i64,
}

impl From<core_donations::Donation> for Donation {
    fn from(d: core_donations::Donation) -> Self {
        Self {
            id: d.id,
            external_id: d.external_id,
            donor_name: d.donor_name,
            amount: d.amount,
            message: d.message,
            received_at: d.received_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub total: i64,
}

impl From<core_leaderboard::LeaderboardEntry> for LeaderboardEntry {
    fn from(e: core_leaderboard::LeaderboardEntry) -> Self {
        Self {
            name: e.donor_name,
            total: e.total,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct LeaderboardEditRecord {
    pub old_name: String,
    pub new_name: String,
    pub old_total: i64,
    pub new_total: i64,
    pub merged: bool,
    pub timestamp: i64,
}

impl From<core_leaderboard::LeaderboardEditRecord> for LeaderboardEditRecord {
    fn from(r: core_leaderboard::LeaderboardEditRecord) -> Self {
        Self {
            old_name: r.old_name,
            new_name: r.new_name,
            old_total: r.old_total,
            new_total: r.new_total,
            merged: r.merged,
            timestamp: r.timestamp,
        }
    }
}

pub fn donations(items: Vec<core_donations::Donation>) -> Vec<Donation> {
    items.into_iter().map(Donation::from).collect()
}

#[derive(Serialize, ToSchema, Debug)]
pub struct QueueSnapshot {
    pub queue: Vec<Donation>,
    pub count: usize,
    pub notification_counter: u64,
    pub has_new_data: bool,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CombinedSnapshot {
    pub queue: Vec<Donation>,
    pub queue_count: usize,
    /// `null` when the caller passed `leaderboard=false`.
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
    pub leaderboard_count: usize,
    pub notification_counter: u64,
    pub has_new_data: bool,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AckResponse {
    pub status: String,
    pub removed: usize,
    pub remaining: usize,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct WebhookAccepted {
    pub status: String,
    pub unique_id: String,
    pub external_id: String,
    pub queue_position: usize,
    pub notification_counter: u64,
    pub data: Donation,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct WebhookDuplicate {
    pub status: String,
    pub message: String,
    pub external_id: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct NoDonation {
    #[schema(value_type = Option<Object>)]
    pub data: Option<()>,
    pub message: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct WriteLeaderboardResponse {
    pub status: String,
    /// `created` or `updated`.
    pub action: String,
    pub name: String,
    pub amount: i64,
    pub existing_total: i64,
    pub final_total: i64,
    pub notification_counter: u64,
    pub message: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct EditLeaderboardResponse {
    pub status: String,
    /// `renamed` or `merged`.
    pub action: String,
    pub old_name: String,
    pub new_name: String,
    pub old_total: i64,
    pub existing_total: i64,
    pub final_total: i64,
    pub message: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct MigrationFailure {
    pub key: String,
    pub error: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct MigrationResponse {
    pub status: String,
    pub message: String,
    pub migrated: usize,
    pub total_old_keys: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<MigrationFailure>>,
}

impl From<core_leaderboard::MigrationReport> for MigrationResponse {
    fn from(report: core_leaderboard::MigrationReport) -> Self {
        let message = if report.total_old_keys == 0 {
            "No data to migrate"
        } else {
            "Migration completed"
        }
        .to_string();
        let errors = if report.errors.is_empty() {
            None
        } else {
            Some(
                report
                    .errors
                    .into_iter()
                    .map(|f| MigrationFailure {
                        key: f.key,
                        error: f.error,
                    })
                    .collect(),
            )
        };
        Self {
            status: "ok".to_string(),
            message,
            migrated: report.migrated,
            total_old_keys: report.total_old_keys,
            errors,
        }
    }
}
