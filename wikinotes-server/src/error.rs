//! Mapping of core outcomes onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use wikinotes_core::WikiError;

/// Errors returned by request handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Wiki(WikiError),
    BadRequest(String),
    Internal(String),
}

impl From<WikiError> for ApiError {
    fn from(err: WikiError) -> Self {
        ApiError::Wiki(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Wiki(err) => write!(f, "{}", err),
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Wiki(WikiError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Wiki(WikiError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Wiki(WikiError::Validation(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Wiki(WikiError::Storage(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(err = %self, "request failed");
        }
        let message = match &self {
            ApiError::Wiki(WikiError::NotFound(_)) => "Page not found".to_string(),
            ApiError::Wiki(WikiError::Conflict(_)) => {
                "Page with this name already exists".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
