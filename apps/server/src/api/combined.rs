use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tipstream_core::constants::LEADERBOARD_MAX;
use utoipa::IntoParams;

use super::{
    change::{counter_headers, no_cache, not_modified, observe, ChangeQuery},
    endpoint,
};
use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{donations, CombinedSnapshot, LeaderboardEntry},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CombinedQuery {
    pub last_counter: Option<String>,
    pub long_poll: Option<String>,
    pub wait_ms: Option<String>,
    /// `false` leaves the leaderboard out of the response.
    pub leaderboard: Option<String>,
}

impl CombinedQuery {
    fn include_leaderboard(&self) -> bool {
        self.leaderboard.as_deref() != Some("false")
    }

    fn change(&self) -> ChangeQuery {
        ChangeQuery {
            last_counter: self.last_counter.clone(),
            long_poll: self.long_poll.clone(),
            wait_ms: self.wait_ms.clone(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/combined",
    params(CombinedQuery),
    responses(
        (status = 200, description = "Queue, leaderboard and counter in one payload", body = CombinedSnapshot),
        (status = 304, description = "Counter unchanged since last_counter"),
    )
)]
pub async fn get_combined(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CombinedQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let change = query.change();
    let last_known = change.last_counter();
    let observation = observe(&state, &change).await?;
    if observation.is_not_modified(last_known) {
        return Ok(not_modified(observation.counter));
    }

    let queue = donations(state.queue_service.peek_all().await?);
    let leaderboard = if query.include_leaderboard() {
        Some(
            state
                .leaderboard_service
                .top_n(LEADERBOARD_MAX)
                .await?
                .into_iter()
                .map(LeaderboardEntry::from)
                .collect::<Vec<_>>(),
        )
    } else {
        None
    };

    let body = CombinedSnapshot {
        queue_count: queue.len(),
        queue,
        leaderboard_count: leaderboard.as_ref().map_or(0, Vec::len),
        leaderboard,
        notification_counter: observation.counter,
        has_new_data: observation.has_new_data(last_known),
    };
    Ok((no_cache(), counter_headers(observation.counter), Json(body)).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/combined", endpoint(get(get_combined)))
}
