mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use tempfile::tempdir;
use tipstream_server::{api::app_router, build_state, config::StoreBackend};

#[tokio::test]
async fn healthz_works() {
    let app = app();
    let response = get(&app.router, "/healthz").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"ok");
}

#[tokio::test]
async fn openapi_document_lists_the_routes() {
    let app = app();
    let doc = get(&app.router, "/openapi.json").await.json();
    for path in ["/webhook", "/queue", "/combined", "/leaderboard", "/edit-history"] {
        assert!(doc["paths"][path].is_object(), "missing {}", path);
    }
}

#[tokio::test]
async fn sqlite_backed_state_persists_across_rebuilds() {
    let tmp = tempdir().unwrap();
    let mut config = test_config();
    config.store = StoreBackend::Sqlite;
    config.db_path = tmp.path().join("tipstream.db").to_string_lossy().into_owned();

    let state = build_state(&config).await.unwrap();
    let router = app_router(state, &config);
    assert_eq!(get(&router, "/healthz").await.status, StatusCode::OK);

    let accepted = webhook(&router, json!({"id": "d1", "supporter": "Alice", "amount": 5000})).await;
    assert_eq!(accepted.status, StatusCode::OK);
    drop(router);

    let state = build_state(&config).await.unwrap();
    let router = app_router(state, &config);
    let queue = get(&router, "/queue").await.json();
    assert_eq!(queue["count"], 1);
    assert_eq!(queue["notification_counter"], 1);
    assert_eq!(
        get(&router, "/leaderboard").await.json(),
        json!([{"name": "Alice", "total": 5000}])
    );

    let retry = webhook(&router, json!({"id": "d1", "supporter": "Alice", "amount": 5000})).await;
    assert_eq!(retry.json()["message"], "Already processed");
}
