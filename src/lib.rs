//! Ranking Flight - a ranking server protected against cache stampedes
//!
//! Serves an expensive ranking through a TTL cache. Concurrent misses for
//! the same key are coalesced so the ranking query runs at most once at a time.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod flight;
pub mod models;
pub mod producer;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{CacheStatus, Coordinator, Lookup};
pub use producer::{Producer, SimulatedRankingDb};
pub use tasks::spawn_cleanup_task;
