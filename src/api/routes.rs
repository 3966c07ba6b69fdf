//! API Routes
//!
//! Configures the Axum router with all ranking server endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    board_ranking_handler, health_handler, invalidate_handler, ranking_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /ranking` - Default ranking, `X-Cache` header set
/// - `GET /ranking/:board` - Ranking for a named board
/// - `DELETE /cache/:key` - Invalidate a cached value
/// - `GET /stats` - Request outcome statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin and exposes `X-Cache`
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/ranking", get(ranking_handler))
        .route("/ranking/:board", get(board_ranking_handler))
        .route("/cache/:key", delete(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Coordinator;
    use crate::producer::SimulatedRankingDb;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let producer = Arc::new(SimulatedRankingDb::new(Duration::ZERO, 10));
        let state = AppState::new(Coordinator::new(producer, Duration::from_secs(10)));
        create_router(state)
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(get_status(create_test_app(), "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        assert_eq!(get_status(create_test_app(), "/stats").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ranking_endpoint() {
        assert_eq!(get_status(create_test_app(), "/ranking").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_board_endpoint_rejects_invalid_name() {
        assert_eq!(
            get_status(create_test_app(), "/ranking/bad%20name").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_invalidate_missing_key() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/cache/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
