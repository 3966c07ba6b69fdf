//! API Module
//!
//! HTTP handlers and routing for the ranking server.
//!
//! # Endpoints
//! - `GET /ranking` - Ranking JSON with an `X-Cache: HIT|MISS|SHARED` header
//! - `GET /ranking/:board` - Same, for a named board
//! - `DELETE /cache/:key` - Invalidate a cached value
//! - `GET /stats` - Request outcome statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
