//! Cache Module
//!
//! Keyed TTL storage for serialized rankings plus request outcome counters.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::{CacheStats, StatsRecorder};
pub use store::TtlCache;
