use std::{collections::HashSet, sync::Arc};

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use super::{
    change::{counter_headers, no_cache, not_modified, observe, ChangeQuery},
    endpoint, json_body,
};
use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{donations, AckResponse, QueueSnapshot},
};

#[utoipa::path(
    get,
    path = "/queue",
    params(ChangeQuery),
    responses(
        (status = 200, description = "Pending donations", body = QueueSnapshot),
        (status = 304, description = "Counter unchanged since last_counter"),
    )
)]
pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ChangeQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let last_known = query.last_counter();
    let observation = observe(&state, &query).await?;
    if observation.is_not_modified(last_known) {
        return Ok(not_modified(observation.counter));
    }

    let queue = donations(state.queue_service.peek_all().await?);
    let body = QueueSnapshot {
        count: queue.len(),
        queue,
        notification_counter: observation.counter,
        has_new_data: observation.has_new_data(last_known),
    };
    Ok((no_cache(), counter_headers(observation.counter), Json(body)).into_response())
}

#[utoipa::path(
    post,
    path = "/queue",
    responses(
        (status = 200, description = "Acknowledged ids removed", body = AckResponse),
        (status = 400, description = "processed_ids missing or empty"),
    )
)]
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Response> {
    let payload = json_body(&body)?;
    let ids = processed_ids(&payload);
    let result = state.queue_service.acknowledge(&ids).await?;
    let counter = state.notifier.current().await?;
    let body = AckResponse {
        status: "ok".to_string(),
        removed: result.removed,
        remaining: result.remaining,
    };
    Ok((counter_headers(counter), Json(body)).into_response())
}

/// Collects `processed_ids`, accepting numeric ids. Anything else reads as empty.
fn processed_ids(payload: &Value) -> HashSet<String> {
    payload
        .get("processed_ids")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| match id {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/queue", endpoint(get(get_queue).post(acknowledge)))
}
