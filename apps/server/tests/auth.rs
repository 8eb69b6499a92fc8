mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::*;
use serde_json::json;

#[tokio::test]
async fn webhook_rejects_missing_and_wrong_tokens() {
    let app = app();

    let response = post_json(&app.router, "/webhook", json!({"id": "d1"})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json(), json!({"error": "Unauthorized"}));

    let response = post_json(&app.router, "/webhook?token=nope", json!({"id": "d1"})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let queue = get(&app.router, "/queue").await.json();
    assert_eq!(queue["count"], 0);
    assert_eq!(queue["notification_counter"], 0);
}

#[tokio::test]
async fn webhook_accepts_token_from_body_or_header() {
    let app = app();

    let response = post_json(
        &app.router,
        "/webhook",
        json!({"id": "body-token", "amount": 1, "token": WEBHOOK_TOKEN}),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(
        &app.router,
        Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .header("sb-webhook-token", WEBHOOK_TOKEN)
            .body(Body::from(json!({"id": "header-token"}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["external_id"], "header-token");
}

#[tokio::test]
async fn webhook_without_configured_secret_is_misconfigured() {
    let mut config = test_config();
    config.webhook_token = None;
    let app = app_with(config);

    let response = post_json(&app.router, "/webhook?token=anything", json!({"id": "d1"})).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"], "Server misconfigured");
}

#[tokio::test]
async fn admin_endpoints_require_admin_token() {
    let app = app();

    for uri in ["/write-leaderboard", "/edit-leaderboard", "/migrate-leaderboard"] {
        let response = post_json(&app.router, uri, json!({"name": "Alice", "amount": 5})).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    // The webhook secret is not an admin secret when both are configured.
    let response = post_json(
        &app.router,
        &format!("/write-leaderboard?token={}", WEBHOOK_TOKEN),
        json!({"name": "Alice", "amount": 5}),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = post_json(
        &app.router,
        "/write-leaderboard",
        json!({"name": "Alice", "amount": 5, "token": ADMIN_TOKEN}),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_body_without_a_token_is_unauthorized() {
    let app = app();
    let malformed = |uri: &str, header: Option<(&'static str, &'static str)>| {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::from("{not json")).unwrap()
    };

    let response = send(&app.router, malformed("/webhook", None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let response = send(&app.router, malformed("/webhook?token=nope", None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let response = send(
        &app.router,
        malformed("/webhook", Some(("sb-webhook-token", WEBHOOK_TOKEN))),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(&app.router, malformed("/edit-leaderboard", None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let response = send(
        &app.router,
        malformed("/edit-leaderboard", Some(("admin-token", ADMIN_TOKEN))),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
