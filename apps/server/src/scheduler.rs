//! Background sweeper for expired store entries.
//!
//! Expired rows already read as absent; the sweep only reclaims space taken by
//! dedup markers and stale queue values.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use tipstream_storage_sqlite::SqliteStore;

/// Sweep interval: 1 hour
const SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Starts the background expiry sweeper. The first sweep runs one interval
/// after startup, since opening the store already purges once.
pub fn start_expiry_sweeper(store: Arc<SqliteStore>) {
    tokio::spawn(async move {
        info!("Expiry sweeper started (1-hour interval)");

        let period = Duration::from_secs(SWEEP_INTERVAL_SECS);
        let mut sweep_interval = interval(period);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        sweep_interval.tick().await;

        loop {
            sweep_interval.tick().await;
            run_sweep(&store).await;
        }
    });
}

async fn run_sweep(store: &SqliteStore) {
    match store.purge_expired().await {
        Ok(0) => debug!("Expiry sweep found nothing to remove"),
        Ok(removed) => info!("Expiry sweep removed {} entries", removed),
        Err(e) => warn!("Expiry sweep failed: {}", e),
    }
}
