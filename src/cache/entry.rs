//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A serialized ranking together with the instant it stops being valid.
///
/// Entries are replaced wholesale on every write, never edited in place.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: String,
    /// First instant at which the entry is no longer valid
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    // == Is Valid ==
    /// An entry is valid strictly before `expires_at`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}
