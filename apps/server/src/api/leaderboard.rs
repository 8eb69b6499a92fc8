use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::CACHE_CONTROL, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tipstream_core::{
    constants::{EDIT_HISTORY_DEFAULT_LIMIT, LEADERBOARD_MAX},
    donations::coerce_amount,
    errors::ValidationError,
    leaderboard::RenameAction,
};
use utoipa::IntoParams;

use super::{change::counter_headers, endpoint, TokenQuery};
use crate::{
    auth::{authenticate_body, require_admin, ADMIN_TOKEN_HEADER},
    error::ApiResult,
    main_lib::AppState,
    models::{
        EditLeaderboardResponse, LeaderboardEditRecord, LeaderboardEntry,
        WriteLeaderboardResponse,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    /// Positive leading integer, else `default`.
    pub fn limit_or(&self, default: usize) -> usize {
        self.limit
            .as_deref()
            .map(str::trim)
            .map(|raw| {
                let end = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
                &raw[..end]
            })
            .and_then(|digits| digits.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default)
    }
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    responses((status = 200, description = "Top donors, highest total first", body = [LeaderboardEntry]))
)]
pub async fn get_leaderboard(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let entries: Vec<LeaderboardEntry> = state
        .leaderboard_service
        .top_n(LEADERBOARD_MAX)
        .await?
        .into_iter()
        .map(LeaderboardEntry::from)
        .collect();
    Ok((
        [(CACHE_CONTROL, "public, max-age=10")],
        Json(entries),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/write-leaderboard",
    params(TokenQuery),
    responses(
        (status = 200, description = "Amount added to the donor's total", body = WriteLeaderboardResponse),
        (status = 400, description = "Missing name or non-positive amount"),
        (status = 401, description = "Missing or wrong admin token"),
    )
)]
pub async fn write_leaderboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let (payload, _) = authenticate_body(
        &body,
        query.token.as_deref(),
        &headers,
        ADMIN_TOKEN_HEADER,
        |provided| require_admin(&state, provided),
    )?;

    let name = required_text(&payload, "name")?;
    let raw_amount = payload
        .get("amount")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ValidationError::MissingField("amount".to_string()))?;
    let amount = coerce_amount(raw_amount);

    let result = state.leaderboard_service.write(&name, amount).await?;
    let body = WriteLeaderboardResponse {
        status: "ok".to_string(),
        action: if result.is_new { "created" } else { "updated" }.to_string(),
        message: format!("Added {} to {} (total {})", amount, name, result.final_total),
        name,
        amount,
        existing_total: result.existing_total,
        final_total: result.final_total,
        notification_counter: result.notification_counter,
    };
    Ok((counter_headers(result.notification_counter), Json(body)).into_response())
}

#[utoipa::path(
    post,
    path = "/edit-leaderboard",
    params(TokenQuery),
    responses(
        (status = 200, description = "Entry renamed or merged", body = EditLeaderboardResponse),
        (status = 401, description = "Missing or wrong admin token"),
        (status = 404, description = "old_name has no positive total"),
    )
)]
pub async fn edit_leaderboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let (payload, _) = authenticate_body(
        &body,
        query.token.as_deref(),
        &headers,
        ADMIN_TOKEN_HEADER,
        |provided| require_admin(&state, provided),
    )?;

    let old_name = required_text(&payload, "old_name")?;
    let new_name = required_text(&payload, "new_name")?;
    let outcome = state
        .leaderboard_service
        .rename(&old_name, &new_name)
        .await?;
    let counter = state.notifier.current().await?;

    let (action, message) = match outcome.action {
        RenameAction::Merged => (
            "merged",
            format!("Merged {} into {} ({} total)", old_name, new_name, outcome.final_total),
        ),
        RenameAction::Renamed => (
            "renamed",
            format!("Renamed {} to {}", old_name, new_name),
        ),
    };
    let body = EditLeaderboardResponse {
        status: "ok".to_string(),
        action: action.to_string(),
        old_name,
        new_name,
        old_total: outcome.old_total,
        existing_total: outcome.existing_total,
        final_total: outcome.final_total,
        message,
    };
    Ok((counter_headers(counter), Json(body)).into_response())
}

#[utoipa::path(
    get,
    path = "/edit-history",
    params(LimitQuery),
    responses((status = 200, description = "Rename and merge log, newest first", body = [LeaderboardEditRecord]))
)]
pub async fn get_edit_history(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let records: Vec<LeaderboardEditRecord> = state
        .leaderboard_service
        .edit_history(query.limit_or(EDIT_HISTORY_DEFAULT_LIMIT))
        .await?
        .into_iter()
        .map(LeaderboardEditRecord::from)
        .collect();
    Ok(([(CACHE_CONTROL, "no-cache")], Json(records)).into_response())
}

/// Non-blank string field, kept verbatim. Numbers are accepted and stringified.
fn required_text(payload: &Value, field: &str) -> ApiResult<String> {
    let text = match payload.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if text.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()).into());
    }
    Ok(text)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/leaderboard", endpoint(get(get_leaderboard)))
        .route("/write-leaderboard", endpoint(post(write_leaderboard)))
        .route("/edit-leaderboard", endpoint(post(edit_leaderboard)))
        .route("/edit-history", endpoint(get(get_edit_history)))
}
