//! Cache Store Module
//!
//! Keyed TTL cache behind a reader/writer lock. Expiry is lazy: reads treat
//! expired entries as absent and leave removal to `purge_expired`.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::CacheEntry;

// == TTL Cache ==
/// Thread-safe map from key to serialized payload with expiry.
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    // == Constructor ==
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the value for `key` if present and not yet expired.
    ///
    /// Missing and expired entries are both reported as `None`.
    pub async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries
            .get(key)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Inserts or replaces the entry for `key`, expiring `ttl` from now.
    pub async fn set(&self, key: impl Into<String>, value: String, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl);
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), entry);
    }

    // == Invalidate ==
    /// Drops the entry for `key`. Returns whether a valid entry was removed.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries
            .remove(key)
            .is_some_and(|entry| entry.is_valid_at(Instant::now()))
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        before - entries.len()
    }

    // == Length ==
    /// Number of stored entries, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_store_new() {
        let cache = TtlCache::new();
        assert_eq!(cache.len().await, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let cache = TtlCache::new();

        cache.set("ranking", "value1".to_string(), TTL).await;

        assert_eq!(cache.get("ranking").await.as_deref(), Some("value1"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let cache = TtlCache::new();
        assert!(cache.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let cache = TtlCache::new();

        cache.set("ranking", "value1".to_string(), TTL).await;
        cache.set("ranking", "value2".to_string(), TTL).await;

        assert_eq!(cache.get("ranking").await.as_deref(), Some("value2"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_expiry_boundary() {
        let cache = TtlCache::new();
        cache.set("ranking", "value".to_string(), TTL).await;

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert!(cache.get("ranking").await.is_some(), "valid just before expiry");

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(cache.get("ranking").await.is_none(), "absent just after expiry");
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_does_not_remove_expired_entries() {
        let cache = TtlCache::new();
        cache.set("ranking", "value".to_string(), Duration::from_secs(1)).await;

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("ranking").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_expiry() {
        let cache = TtlCache::new();
        cache.set("ranking", "old".to_string(), TTL).await;

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("ranking", "new".to_string(), TTL).await;

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("ranking").await.as_deref(), Some("new"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("ranking").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = TtlCache::new();

        cache.set("short", "value1".to_string(), Duration::from_secs(1)).await;
        cache.set("long", "value2".to_string(), TTL).await;

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("long").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = TtlCache::new();
        cache.set("ranking", "value".to_string(), TTL).await;

        assert!(cache.invalidate("ranking").await);
        assert!(cache.get("ranking").await.is_none());
        assert!(!cache.invalidate("ranking").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_see_whole_values() {
        let cache = Arc::new(TtlCache::new());
        let old = "a".repeat(4096);
        let new = "b".repeat(4096);
        cache.set("ranking", old.clone(), TTL).await;

        let writer = {
            let cache = cache.clone();
            let new = new.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    cache.set("ranking", new.clone(), TTL).await;
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let (old, new) = (old.clone(), new.clone());
            readers.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let value = cache.get("ranking").await.unwrap();
                    assert!(value == old || value == new, "torn read");
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
