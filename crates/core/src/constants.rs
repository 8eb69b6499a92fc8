use std::time::Duration;

/// Maximum number of undelivered donations kept in the queue
pub const QUEUE_MAX: usize = 100;

/// Capacity of the most-recent-first donation history
pub const HISTORY_MAX: usize = 50;

/// Capacity of the leaderboard edit log
pub const EDIT_LOG_MAX: usize = 100;

/// Maximum number of entries served by the leaderboard snapshot
pub const LEADERBOARD_MAX: usize = 100;

/// Default page size for the edit log
pub const EDIT_HISTORY_DEFAULT_LIMIT: usize = 50;

/// Dedup window; also the expiry of queue and history values
pub const DEDUP_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default long-poll window
pub const LONG_POLL_MAX_WAIT: Duration = Duration::from_millis(25_000);

/// Default long-poll re-check interval
pub const LONG_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Fallback donor name when the payload carries none
pub const ANONYMOUS_DONOR: &str = "Anonymous";

// Store keys
pub const QUEUE_KEY: &str = "donation_queue";
pub const HISTORY_KEY: &str = "donation_history";
pub const LATEST_DONATION_KEY: &str = "latest_donation";
pub const COUNTER_KEY: &str = "notification_counter";
pub const LEADERBOARD_KEY: &str = "leaderboard";
pub const EDIT_LOG_KEY: &str = "leaderboard_edit_history";
pub const DEDUP_MARKER_PREFIX: &str = "donation:";

/// Prefix of per-donor total keys written before the leaderboard moved to a sorted set
pub const LEGACY_LEADERBOARD_PREFIX: &str = "leaderboard:";

pub fn dedup_marker_key(external_id: &str) -> String {
    format!("{}{}", DEDUP_MARKER_PREFIX, external_id)
}
