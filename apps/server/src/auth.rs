//! Shared-secret extraction for the webhook and admin endpoints.
//!
//! A token may arrive as the `token` query parameter, a `token` field in the
//! JSON body, or a header, checked in that order. Empty values fall through
//! to the next source.

use axum::{body::Bytes, http::HeaderMap};
use serde_json::Value;
use tipstream_core::tokens::verify_shared_secret;

use crate::{api::json_body, error::ApiResult, main_lib::AppState};

pub const WEBHOOK_TOKEN_HEADER: &str = "sb-webhook-token";
pub const ADMIN_TOKEN_HEADER: &str = "admin-token";

pub fn extract_token(
    query_token: Option<&str>,
    body: &Value,
    headers: &HeaderMap,
    header_name: &str,
) -> Option<String> {
    if let Some(token) = query_token.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }
    match body.get("token") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Number(n)) => return Some(n.to_string()),
        _ => {}
    }
    headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Rejects the request unless `provided` matches the configured admin token.
pub fn require_admin(state: &AppState, provided: Option<&str>) -> ApiResult<()> {
    verify_shared_secret("admin token", state.admin_token.as_deref(), provided)?;
    Ok(())
}

/// Rejects the request unless `provided` matches the configured webhook token.
pub fn require_webhook(state: &AppState, provided: Option<&str>) -> ApiResult<()> {
    verify_shared_secret("webhook token", state.webhook_token.as_deref(), provided)?;
    Ok(())
}

/// Parses the JSON body of an authenticated endpoint and returns it with the
/// verified token.
///
/// A query or header token is verified before the body is parsed. Without
/// one, a body that does not parse is answered by `verify(None)`.
pub fn authenticate_body(
    body: &Bytes,
    query_token: Option<&str>,
    headers: &HeaderMap,
    header_name: &str,
    verify: impl Fn(Option<&str>) -> ApiResult<()>,
) -> ApiResult<(Value, Option<String>)> {
    let early = extract_token(query_token, &Value::Null, headers, header_name);
    if early.is_some() {
        verify(early.as_deref())?;
    }
    let payload = match json_body(body) {
        Ok(payload) => payload,
        Err(e) => {
            if early.is_none() {
                verify(None)?;
            }
            return Err(e);
        }
    };
    let token = extract_token(query_token, &payload, headers, header_name);
    verify(token.as_deref())?;
    Ok((payload, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(name: &'static str, value: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(name, HeaderValue::from_static(value));
        map
    }

    fn verify_secret(provided: Option<&str>) -> ApiResult<()> {
        verify_shared_secret("test token", Some("secret"), provided)?;
        Ok(())
    }

    fn status(result: ApiResult<(Value, Option<String>)>) -> axum::http::StatusCode {
        use axum::response::IntoResponse;
        match result {
            Ok(_) => axum::http::StatusCode::OK,
            Err(e) => e.into_response().status(),
        }
    }

    #[test]
    fn test_malformed_body_without_token_is_unauthorized() {
        let malformed = Bytes::from_static(b"{not json");
        let none = HeaderMap::new();
        assert_eq!(
            status(authenticate_body(&malformed, None, &none, "x-token", verify_secret)),
            axum::http::StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(authenticate_body(&malformed, Some("wrong"), &none, "x-token", verify_secret)),
            axum::http::StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(authenticate_body(&malformed, Some("secret"), &none, "x-token", verify_secret)),
            axum::http::StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(authenticate_body(
                &malformed,
                None,
                &headers("x-token", "secret"),
                "x-token",
                verify_secret
            )),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_body_token_is_verified_after_parsing() {
        let body = Bytes::from_static(br#"{"token": "secret", "id": "d1"}"#);
        let (payload, token) =
            authenticate_body(&body, None, &HeaderMap::new(), "x-token", verify_secret).unwrap();
        assert_eq!(payload["id"], "d1");
        assert_eq!(token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_query_token_wins() {
        let token = extract_token(
            Some("from-query"),
            &json!({"token": "from-body"}),
            &headers(WEBHOOK_TOKEN_HEADER, "from-header"),
            WEBHOOK_TOKEN_HEADER,
        );
        assert_eq!(token.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_empty_sources_fall_through() {
        let token = extract_token(
            Some(""),
            &json!({"token": ""}),
            &headers(ADMIN_TOKEN_HEADER, "from-header"),
            ADMIN_TOKEN_HEADER,
        );
        assert_eq!(token.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_body_token_and_wrong_header_name() {
        let body = json!({"token": "from-body"});
        let wrong = headers(ADMIN_TOKEN_HEADER, "admin");
        assert_eq!(
            extract_token(None, &body, &wrong, WEBHOOK_TOKEN_HEADER).as_deref(),
            Some("from-body")
        );
        assert_eq!(
            extract_token(None, &json!({}), &wrong, WEBHOOK_TOKEN_HEADER),
            None
        );
    }
}
