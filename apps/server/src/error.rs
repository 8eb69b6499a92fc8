use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tipstream_core::errors::{Error as CoreError, ValidationError};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                CoreError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                CoreError::Unconfigured(what) => {
                    tracing::error!("[CRITICAL] Server misconfigured: {}", what);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server misconfigured".to_string(),
                    )
                }
                CoreError::Store(_) | CoreError::Serialization(_) | CoreError::Unexpected(_) => {
                    tracing::error!("Request failed: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Anyhow(e) => {
                tracing::error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        // Validation failures name the offending field; nothing else leaks detail.
        let details = match &self {
            ApiError::Core(CoreError::Validation(v)) => v.field().map(str::to_string),
            _ => None,
        };
        let body = Json(ErrorBody {
            error: message,
            details,
        });
        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Core(err.into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
