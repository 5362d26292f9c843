// error.rs - HTTP error taxonomy and response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::history::StoreError;

/// Errors surfaced at the route boundary
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid payload: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // Kept for symmetry with the store; delete is idempotent so no route
    // currently returns it
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "Invalid image info",
                    "details": details,
                }),
            ),
            ApiError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": self.to_string() }),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": self.to_string() }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Storage(other.to_string()),
        }
    }
}
