//! API error types.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rule store or holiday service failed.
    #[error("upstream unavailable: {0}")]
    Upstream(String),
}

impl From<officehours_core::Error> for ApiError {
    fn from(err: officehours_core::Error) -> Self {
        match err {
            officehours_core::Error::NotFound(id) => ApiError::NotFound(id),
            officehours_core::Error::InvalidRule(e) => ApiError::BadRequest(e.to_string()),
            officehours_core::Error::UpstreamUnavailable(msg) => ApiError::Upstream(msg),
        }
    }
}

impl From<officehours_core::ValidationError> for ApiError {
    fn from(err: officehours_core::ValidationError) -> Self {
        officehours_core::Error::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
