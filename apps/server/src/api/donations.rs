use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tipstream_core::constants::HISTORY_MAX;

use super::{change::no_cache, endpoint, leaderboard::LimitQuery};
use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{donations, Donation, NoDonation},
};

#[utoipa::path(
    get,
    path = "/get-donation",
    responses(
        (status = 200, description = "Most recent donation, or a null payload when none exist", body = Donation),
    )
)]
pub async fn get_latest_donation(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let response = match state.donation_service.latest().await? {
        Some(donation) => (no_cache(), Json(Donation::from(donation))).into_response(),
        None => (
            no_cache(),
            Json(NoDonation {
                data: None,
                message: "No donations yet".to_string(),
            }),
        )
            .into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/history",
    params(LimitQuery),
    responses((status = 200, description = "Recent donations, newest first", body = [Donation]))
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let history = state
        .donation_service
        .history(query.limit_or(HISTORY_MAX))
        .await?;
    Ok((no_cache(), Json(donations(history))).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get-donation", endpoint(get(get_latest_donation)))
        .route("/history", endpoint(get(get_history)))
}
