//! Mapping of relay errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use persona_relay::ChatError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body sent for every internal failure. Details stay in the logs.
pub const GENERIC_FAILURE: &str = "Failed to generate reply";

/// `{ "error": "..." }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Error returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with the message shown to the client.
    BadRequest(String),
    /// 500 with [`GENERIC_FAILURE`]; the detail is only logged.
    Internal(String),
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(msg))).into_response()
            }
            ApiError::Internal(detail) => {
                error!("Chat request failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(GENERIC_FAILURE)),
                )
                    .into_response()
            }
        }
    }
}
