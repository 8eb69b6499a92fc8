#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tipstream_core::store::{KeyValueStore, MemoryStore};
use tipstream_server::{
    api::app_router,
    config::{Config, StoreBackend},
    AppState,
};
use tower::ServiceExt;

pub const WEBHOOK_TOKEN: &str = "hook-secret";
pub const ADMIN_TOKEN: &str = "admin-secret";

pub fn test_config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        store: StoreBackend::Memory,
        db_path: String::new(),
        webhook_token: Some(WEBHOOK_TOKEN.to_string()),
        admin_token: Some(ADMIN_TOKEN.to_string()),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(10),
        long_poll_max_wait: Duration::from_millis(300),
        long_poll_interval: Duration::from_millis(20),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn KeyValueStore>,
}

pub fn app_with(config: Config) -> TestApp {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::from_store(store.clone(), &config));
    TestApp {
        router: app_router(state, &config),
        store,
    }
}

pub fn app() -> TestApp {
    app_with(test_config())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> TestResponse {
    send(
        router,
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn webhook(router: &Router, body: Value) -> TestResponse {
    post_json(router, &format!("/webhook?token={}", WEBHOOK_TOKEN), body).await
}

pub async fn admin_post(router: &Router, uri: &str, body: Value) -> TestResponse {
    send(
        router,
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("admin-token", ADMIN_TOKEN)
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}
