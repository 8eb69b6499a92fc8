use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::{change::counter_headers, endpoint, TokenQuery};
use crate::{
    auth::{authenticate_body, require_admin, ADMIN_TOKEN_HEADER},
    error::ApiResult,
    main_lib::AppState,
    models::MigrationResponse,
};

/// Folds legacy `leaderboard:<name>` keys into the sorted leaderboard.
#[utoipa::path(
    post,
    path = "/migrate-leaderboard",
    params(TokenQuery),
    responses(
        (status = 200, description = "Migration report", body = MigrationResponse),
        (status = 401, description = "Missing or wrong admin token"),
    )
)]
pub async fn migrate_leaderboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let Query(query) = query?;
    authenticate_body(
        &body,
        query.token.as_deref(),
        &headers,
        ADMIN_TOKEN_HEADER,
        |provided| require_admin(&state, provided),
    )?;

    let report = state.leaderboard_service.migrate_legacy().await?;
    tracing::info!(
        "Leaderboard migration: {} of {} legacy keys migrated, {} failures",
        report.migrated,
        report.total_old_keys,
        report.errors.len()
    );
    let counter = state.notifier.current().await?;
    Ok((counter_headers(counter), Json(MigrationResponse::from(report))).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/migrate-leaderboard", endpoint(post(migrate_leaderboard)))
}
