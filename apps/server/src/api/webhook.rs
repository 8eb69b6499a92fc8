use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tipstream_core::donations::IngestOutcome;

use super::{change::counter_headers, endpoint, TokenQuery};
use crate::{
    auth::{authenticate_body, require_webhook, WEBHOOK_TOKEN_HEADER},
    error::ApiResult,
    main_lib::AppState,
    models::{Donation, WebhookAccepted, WebhookDuplicate},
};

#[utoipa::path(
    post,
    path = "/webhook",
    params(TokenQuery),
    responses(
        (status = 200, description = "Donation accepted, or already processed", body = WebhookAccepted),
        (status = 401, description = "Missing or wrong webhook token"),
    )
)]
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let (payload, token) = authenticate_body(
        &body,
        query.token.as_deref(),
        &headers,
        WEBHOOK_TOKEN_HEADER,
        |provided| require_webhook(&state, provided),
    )?;

    match state
        .donation_service
        .ingest(&payload, token.as_deref())
        .await?
    {
        IngestOutcome::Accepted {
            donation,
            queue_position,
            notification_counter,
        } => {
            tracing::info!(
                "Webhook accepted {} ({} +{}), counter {}",
                donation.id,
                donation.donor_name,
                donation.amount,
                notification_counter
            );
            let body = WebhookAccepted {
                status: "ok".to_string(),
                unique_id: donation.id.clone(),
                external_id: donation.external_id.clone(),
                queue_position,
                notification_counter,
                data: Donation::from(donation),
            };
            Ok((counter_headers(notification_counter), Json(body)).into_response())
        }
        IngestOutcome::Duplicate { external_id } => {
            tracing::info!("Webhook retry for {} ignored", external_id);
            let counter = state.notifier.current().await?;
            let body = WebhookDuplicate {
                status: "ok".to_string(),
                message: "Already processed".to_string(),
                external_id,
            };
            Ok((counter_headers(counter), Json(body)).into_response())
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", endpoint(post(receive_webhook)))
        .route("/webhook/sociabuzz", endpoint(post(receive_webhook)))
}
