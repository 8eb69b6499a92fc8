//! Change-detection helpers shared by the counter-bearing read endpoints.

use std::time::Duration;

use axum::{
    http::{
        header::{CACHE_CONTROL, ETAG},
        HeaderName, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tipstream_core::notifier::ChangeObservation;
use utoipa::IntoParams;

use crate::{error::ApiResult, main_lib::AppState};

pub const NOTIFICATION_COUNTER_HEADER: HeaderName =
    HeaderName::from_static("x-notification-counter");
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChangeQuery {
    /// Counter value the caller saw last. Defaults to 0.
    pub last_counter: Option<String>,
    /// `true` or `1` waits for a change before answering.
    pub long_poll: Option<String>,
    /// Upper bound on the wait, capped by the server's window.
    pub wait_ms: Option<String>,
}

impl ChangeQuery {
    pub fn last_counter(&self) -> u64 {
        self.last_counter
            .as_deref()
            .and_then(leading_digits)
            .unwrap_or(0)
    }

    pub fn wants_long_poll(&self) -> bool {
        matches!(self.long_poll.as_deref().map(str::trim), Some("true" | "1"))
    }

    pub fn wait(&self, max_wait: Duration) -> Duration {
        self.wait_ms
            .as_deref()
            .and_then(leading_digits)
            .map(Duration::from_millis)
            .map_or(max_wait, |requested| requested.min(max_wait))
    }
}

/// Reads the counter, waiting for it to pass `last_counter` when the caller
/// asked for a long poll.
pub async fn observe(state: &AppState, query: &ChangeQuery) -> ApiResult<ChangeObservation> {
    let last_known = query.last_counter();
    if query.wants_long_poll() {
        let observation = state
            .notifier
            .await_change(
                last_known,
                query.wait(state.long_poll.max_wait),
                state.long_poll.interval,
            )
            .await?;
        tracing::debug!(
            "Long poll from {} returned {} after {}ms",
            last_known,
            observation.counter,
            observation.waited.as_millis()
        );
        Ok(observation)
    } else {
        Ok(ChangeObservation {
            counter: state.notifier.current().await?,
            waited: Duration::ZERO,
        })
    }
}

/// `ETag` and `X-Notification-Counter` carrying the current counter.
pub fn counter_headers(counter: u64) -> [(HeaderName, String); 2] {
    [
        (ETAG, counter.to_string()),
        (NOTIFICATION_COUNTER_HEADER, counter.to_string()),
    ]
}

pub fn no_cache() -> [(HeaderName, &'static str); 1] {
    [(CACHE_CONTROL, NO_CACHE)]
}

/// 304 with the counter tag and no body.
pub fn not_modified(counter: u64) -> Response {
    (
        StatusCode::NOT_MODIFIED,
        no_cache(),
        [(ETAG, counter.to_string())],
    )
        .into_response()
}

/// Parses the leading run of digits, so `"12abc"` reads as 12.
fn leading_digits(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
