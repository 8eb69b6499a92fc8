use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::scheduler;
use tipstream_core::{
    donations::{DonationService, DonationServiceTrait},
    leaderboard::{LeaderboardService, LeaderboardServiceTrait},
    notifier::{ChangeNotifier, ChangeNotifierTrait},
    queue::{HistoryService, QueueService, QueueServiceTrait},
    store::{KeyValueStore, MemoryStore},
};
use tipstream_storage_sqlite::SqliteStore;

/// Bounds for the long-poll wait loop used by `/queue` and `/combined`.
#[derive(Debug, Clone, Copy)]
pub struct LongPollSettings {
    pub max_wait: Duration,
    pub interval: Duration,
}

pub struct AppState {
    pub donation_service: Arc<dyn DonationServiceTrait>,
    pub queue_service: Arc<dyn QueueServiceTrait>,
    pub leaderboard_service: Arc<dyn LeaderboardServiceTrait>,
    pub notifier: Arc<dyn ChangeNotifierTrait>,
    pub webhook_token: Option<String>,
    pub admin_token: Option<String>,
    pub long_poll: LongPollSettings,
}

impl AppState {
    /// Wires every service over one shared store.
    pub fn from_store(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let notifier = Arc::new(ChangeNotifier::new(store.clone()));
        let queue_service = Arc::new(QueueService::new(store.clone()));
        let history_service = Arc::new(HistoryService::new(store.clone()));
        let leaderboard_service =
            Arc::new(LeaderboardService::new(store.clone(), notifier.clone()));
        let donation_service = Arc::new(DonationService::new(
            store,
            queue_service.clone(),
            history_service,
            leaderboard_service.clone(),
            notifier.clone(),
            config.webhook_token.clone(),
        ));

        AppState {
            donation_service,
            queue_service,
            leaderboard_service,
            notifier,
            webhook_token: config.webhook_token.clone(),
            admin_token: config.admin_token.clone(),
            long_poll: LongPollSettings {
                max_wait: config.long_poll_max_wait,
                interval: config.long_poll_interval,
            },
        }
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("TS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    if config.webhook_token.is_none() {
        tracing::error!("[CRITICAL] TS_WEBHOOK_TOKEN is not set; /webhook will reject every call");
    }

    let store: Arc<dyn KeyValueStore> = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; state is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite => {
            let sqlite = Arc::new(SqliteStore::open(&config.db_path).await?);
            tracing::info!("Database path in use: {}", config.db_path);
            scheduler::start_expiry_sweeper(sqlite.clone());
            sqlite
        }
    };

    Ok(Arc::new(AppState::from_store(store, config)))
}
