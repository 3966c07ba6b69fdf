//! Response DTOs for the ranking server API
//!
//! Defines the structure of outgoing HTTP response bodies. The ranking
//! endpoint itself returns the cached JSON verbatim and has no DTO here.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for cache invalidation (DELETE /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The key that was invalidated
    pub key: String,
}

impl InvalidateResponse {
    /// Creates a new InvalidateResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Requests served from cache
    pub hits: u64,
    /// Requests that led a computation
    pub misses: u64,
    /// Requests that shared an in-flight computation
    pub shared: u64,
    /// Requests that ended in a computation failure
    pub failures: u64,
    /// Times the expensive producer ran
    pub producer_runs: u64,
    /// Keys with a computation currently in flight
    pub in_flight: usize,
    /// Entries currently stored, including not yet purged expired ones
    pub cached_entries: usize,
    /// hits / (hits + misses + shared)
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Builds the response from a counter snapshot and live gauges.
    pub fn new(stats: &CacheStats, in_flight: usize, cached_entries: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            shared: stats.shared,
            failures: stats.failures,
            producer_runs: stats.producer_runs,
            in_flight,
            cached_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_response_serialize() {
        let resp = InvalidateResponse::new("ranking");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("ranking"));
        assert!(json.contains("invalidated"));
    }

    #[test]
    fn test_stats_response_from_snapshot() {
        let stats = CacheStats {
            hits: 8,
            misses: 1,
            shared: 1,
            failures: 0,
            producer_runs: 1,
        };
        let resp = StatsResponse::new(&stats, 0, 1);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.producer_runs, 1);
        assert_eq!(resp.cached_entries, 1);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Internal Server Error");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Internal Server Error"));
    }
}
