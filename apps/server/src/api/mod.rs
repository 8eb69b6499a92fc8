use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{header::ETAG, HeaderValue, Method, StatusCode},
    routing::{get, MethodRouter},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{IntoParams, OpenApi};

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models,
};

pub mod admin;
pub mod change;
pub mod combined;
pub mod donations;
pub mod leaderboard;
pub mod queue;
pub mod webhook;

/// `?token=` for the authenticated endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[utoipa::path(get, path = "/healthz", responses((status = 200, description = "Health")))]
pub async fn healthz() -> &'static str {
    "ok"
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Every route answers a bare `OPTIONS` with 200 and any other unrouted
/// method with a JSON 405.
pub(crate) fn endpoint(route: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
    route.options(preflight).fallback(method_not_allowed)
}

/// Parses a JSON request body. An empty body reads as `{}`.
pub(crate) fn json_body(body: &Bytes) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {}", e)))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz,
        webhook::receive_webhook,
        queue::get_queue,
        queue::acknowledge,
        combined::get_combined,
        leaderboard::get_leaderboard,
        leaderboard::write_leaderboard,
        leaderboard::edit_leaderboard,
        leaderboard::get_edit_history,
        donations::get_latest_donation,
        donations::get_history,
        admin::migrate_leaderboard,
    ),
    components(schemas(
        models::Donation,
        models::LeaderboardEntry,
        models::LeaderboardEditRecord,
        models::QueueSnapshot,
        models::CombinedSnapshot,
        models::AckResponse,
        models::WebhookAccepted,
        models::WebhookDuplicate,
        models::NoDonation,
        models::WriteLeaderboardResponse,
        models::EditLeaderboardResponse,
        models::MigrationFailure,
        models::MigrationResponse,
    )),
    tags((name = "tipstream"))
)]
pub struct ApiDoc;

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.cors_allow.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([ETAG, change::NOTIFICATION_COUNTER_HEADER])
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/healthz", endpoint(get(healthz)))
        .merge(webhook::router())
        .merge(queue::router())
        .merge(combined::router())
        .merge(leaderboard::router())
        .merge(donations::router())
        .merge(admin::router())
        .route(
            "/openapi.json",
            get(move || {
                let doc = openapi.clone();
                async move { Json(doc) }
            }),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer(config))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
