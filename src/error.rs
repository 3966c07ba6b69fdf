//! Error types for the ranking server
//!
//! `ComputeError` is what the coalescing core produces; `ApiError` is what
//! the HTTP layer turns into a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Compute Error Enum ==
/// Failure of a ranking computation.
///
/// Cloneable because one failure is delivered to the leader and to every
/// follower that shared the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    /// The producer reported an error instead of a value
    #[error("producer failed: {0}")]
    Producer(String),

    /// The produced ranking could not be serialized
    #[error("failed to serialize ranking: {0}")]
    Serialize(String),

    /// The leader went away before publishing a result
    #[error("in-flight computation was abandoned by its leader")]
    Abandoned,

    /// A follower gave up waiting for the leader
    #[error("timed out waiting for in-flight computation")]
    TimedOut,
}

impl From<serde_json::Error> for ComputeError {
    fn from(err: serde_json::Error) -> Self {
        ComputeError::Serialize(err.to_string())
    }
}

// == Api Error Enum ==
/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The ranking could not be computed
    #[error("computation failed: {0}")]
    Computation(#[from] ComputeError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Computation(err) => {
                // Detail stays in the logs.
                error!("Ranking computation failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(key) => (StatusCode::NOT_FOUND, format!("Key not found: {}", key)),
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
