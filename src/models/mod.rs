//! Payload and response models for the ranking server
//!
//! The ranking payload that gets cached, and the DTOs serialized by the
//! auxiliary endpoints.

pub mod ranking;
pub mod responses;

// Re-export commonly used types
pub use ranking::{Ranking, RankingItem};
pub use responses::{ErrorResponse, HealthResponse, InvalidateResponse, StatsResponse};
