//! API Handlers
//!
//! HTTP request handlers for each ranking server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::coordinator::{Coordinator, Lookup};
use crate::error::{ApiError, Result};
use crate::models::{HealthResponse, InvalidateResponse, StatsResponse};

/// Response header carrying HIT / MISS / SHARED.
pub const X_CACHE: &str = "x-cache";

/// Cache key served by `GET /ranking`.
pub const DEFAULT_RANKING_KEY: &str = "ranking";

/// Longest board name accepted by `GET /ranking/:board`.
pub const MAX_BOARD_LENGTH: usize = 64;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    /// Creates a new AppState around the given coordinator.
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(Coordinator::from_config(config))
    }
}

/// Cache key for a named leaderboard.
pub fn board_key(board: &str) -> String {
    format!("{}:{}", DEFAULT_RANKING_KEY, board)
}

fn validate_board(board: &str) -> Option<String> {
    if board.is_empty() {
        return Some("Board name cannot be empty".to_string());
    }
    if board.len() > MAX_BOARD_LENGTH {
        return Some(format!(
            "Board name exceeds maximum length of {} characters",
            MAX_BOARD_LENGTH
        ));
    }
    if !board
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Some("Board name may only contain letters, digits, '_' and '-'".to_string());
    }
    None
}

fn ranking_response(lookup: Lookup) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (HeaderName::from_static(X_CACHE), lookup.status.as_str()),
        ],
        lookup.value,
    )
        .into_response()
}

/// Handler for GET /ranking
///
/// Returns the ranking JSON with an `X-Cache` header describing how it was
/// obtained.
pub async fn ranking_handler(State(state): State<AppState>) -> Result<Response> {
    info!("Request started");
    let lookup = state.coordinator.handle(DEFAULT_RANKING_KEY).await?;
    Ok(ranking_response(lookup))
}

/// Handler for GET /ranking/:board
///
/// Same as `/ranking` for a separately cached leaderboard.
pub async fn board_ranking_handler(
    State(state): State<AppState>,
    Path(board): Path<String>,
) -> Result<Response> {
    if let Some(error_msg) = validate_board(&board) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    info!(board = %board, "Request started");
    let lookup = state.coordinator.handle(&board_key(&board)).await?;
    Ok(ranking_response(lookup))
}

/// Handler for DELETE /cache/:key
///
/// Drops a cached value so the next request recomputes it.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if state.coordinator.invalidate(&key).await {
        info!(key = %key, "Cache entry invalidated");
        Ok(Json(InvalidateResponse::new(key)))
    } else {
        Err(ApiError::NotFound(key))
    }
}

/// Handler for GET /stats
///
/// Returns request outcome counters and live gauges.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let coordinator = &state.coordinator;
    Json(StatsResponse::new(
        &coordinator.stats(),
        coordinator.in_flight(),
        coordinator.cached_entries().await,
    ))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
