use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use tipstream_core::constants::{LONG_POLL_INTERVAL, LONG_POLL_MAX_WAIT};

/// Which store adapter backs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub store: StoreBackend,
    pub db_path: String,
    pub webhook_token: Option<String>,
    pub admin_token: Option<String>,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub long_poll_max_wait: Duration,
    pub long_poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("TS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid TS_LISTEN_ADDR")?;
        let store = match std::env::var("TS_STORE") {
            Ok(v) if v.eq_ignore_ascii_case("memory") => StoreBackend::Memory,
            Ok(v) if v.eq_ignore_ascii_case("sqlite") || v.is_empty() => StoreBackend::Sqlite,
            Ok(v) => anyhow::bail!("Invalid TS_STORE '{}': expected sqlite or memory", v),
            Err(_) => StoreBackend::Sqlite,
        };
        let db_path = std::env::var("TS_DB_PATH").unwrap_or_else(|_| "./db/tipstream.db".into());
        let webhook_token = non_empty_var("TS_WEBHOOK_TOKEN");
        let admin_token = non_empty_var("TS_ADMIN_TOKEN").or_else(|| webhook_token.clone());
        let cors_allow = std::env::var("TS_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(Self {
            listen_addr,
            store,
            db_path,
            webhook_token,
            admin_token,
            cors_allow,
            request_timeout: millis_var("TS_REQUEST_TIMEOUT_MS", Duration::from_secs(30)),
            long_poll_max_wait: millis_var("TS_LONG_POLL_MAX_MS", LONG_POLL_MAX_WAIT),
            long_poll_interval: millis_var("TS_LONG_POLL_INTERVAL_MS", LONG_POLL_INTERVAL),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn millis_var(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
