//! Request Coordinator
//!
//! Decides, per request, whether to answer from cache, lead a fresh
//! computation, or share one already in flight.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CacheStats, StatsRecorder, TtlCache};
use crate::config::Config;
use crate::error::ComputeError;
use crate::flight::{FlightError, Group};
use crate::producer::{Producer, SimulatedRankingDb};

// == Cache Status ==
/// How a caller obtained its value. Sent to clients in the `X-Cache` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Served from a valid cache entry
    Hit,
    /// This caller ran the computation
    Miss,
    /// This caller received another caller's computation
    Shared,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Shared => "SHARED",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A served value and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// Serialized ranking
    pub value: String,
    pub status: CacheStatus,
}

impl From<FlightError<ComputeError>> for ComputeError {
    fn from(err: FlightError<ComputeError>) -> Self {
        match err {
            FlightError::Failed(inner) => inner,
            FlightError::Abandoned => ComputeError::Abandoned,
            FlightError::TimedOut => ComputeError::TimedOut,
        }
    }
}

// == Coordinator ==
/// Owns the cache, the in-flight group and the producer for one server.
pub struct Coordinator {
    cache: Arc<TtlCache>,
    group: Group<String, ComputeError>,
    producer: Arc<dyn Producer>,
    stats: StatsRecorder,
    ttl: Duration,
    wait_timeout: Option<Duration>,
}

impl Coordinator {
    // == Constructor ==
    /// Creates a coordinator with an empty cache.
    ///
    /// # Arguments
    /// * `producer` - The expensive computation
    /// * `ttl` - Lifetime of each computed value in the cache
    pub fn new(producer: Arc<dyn Producer>, ttl: Duration) -> Self {
        Self {
            cache: Arc::new(TtlCache::new()),
            group: Group::new(),
            producer,
            stats: StatsRecorder::new(),
            ttl,
            wait_timeout: None,
        }
    }

    /// Bounds how long a follower waits for the leader.
    pub fn with_wait_timeout(mut self, wait: Duration) -> Self {
        self.wait_timeout = Some(wait);
        self
    }

    /// Builds a coordinator backed by the simulated ranking database.
    pub fn from_config(config: &Config) -> Self {
        let producer = Arc::new(SimulatedRankingDb::from_config(config));
        let coordinator = Self::new(producer, config.cache_ttl());
        match config.wait_timeout() {
            Some(wait) => coordinator.with_wait_timeout(wait),
            None => coordinator,
        }
    }

    // == Handle ==
    /// Serves `key` from cache, or through the in-flight group on a miss.
    ///
    /// On failure nothing is cached and the error is the same one every
    /// caller sharing the computation receives.
    pub async fn handle(&self, key: &str) -> Result<Lookup, ComputeError> {
        let start = Instant::now();

        if let Some(value) = self.cache.get(key).await {
            self.stats.record_hit();
            info!(key, elapsed = ?start.elapsed(), "Cache HIT");
            return Ok(Lookup {
                value,
                status: CacheStatus::Hit,
            });
        }

        info!(key, "Cache MISS - using singleflight");

        let lead = || {
            self.stats.record_producer_run();
            compute(
                self.producer.clone(),
                self.cache.clone(),
                key.to_owned(),
                self.ttl,
            )
        };
        let execution = match self.wait_timeout {
            Some(wait) => self.group.execute_with_timeout(key, wait, lead).await,
            None => self.group.execute(key, lead).await,
        };

        let value = match execution.result {
            Ok(value) => value,
            Err(err) => {
                self.stats.record_failure();
                warn!(key, shared = execution.shared, error = %err, "Ranking computation failed");
                return Err(err.into());
            }
        };

        let status = if execution.shared {
            self.stats.record_shared();
            CacheStatus::Shared
        } else {
            self.stats.record_miss();
            CacheStatus::Miss
        };

        info!(key, %status, elapsed = ?start.elapsed(), "Response ready");
        Ok(Lookup { value, status })
    }

    // == Invalidate ==
    /// Drops the cached value for `key`. Returns whether one was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.cache.invalidate(key).await
    }

    // == Accessors ==
    /// Shared handle to the cache, for the background sweep.
    pub fn cache(&self) -> Arc<TtlCache> {
        self.cache.clone()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Keys with a computation currently in flight.
    pub fn in_flight(&self) -> usize {
        self.group.in_flight()
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.len().await
    }
}

/// Leader-only: runs the producer and populates the cache on success.
///
/// Takes owned handles because it runs on its own task and must finish even
/// when the request that started it has gone away.
async fn compute(
    producer: Arc<dyn Producer>,
    cache: Arc<TtlCache>,
    key: String,
    ttl: Duration,
) -> Result<String, ComputeError> {
    info!(key = %key, "DB query started (LEADER)");

    let ranking = producer.produce(&key).await?;
    let data = serde_json::to_string(&ranking)?;
    cache.set(key.as_str(), data.clone(), ttl).await;

    info!(key = %key, "DB query completed (LEADER)");
    Ok(data)
}
