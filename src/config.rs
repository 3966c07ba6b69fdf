//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Simulated latency of the ranking query in milliseconds
    pub db_delay_ms: u64,
    /// Lifetime of a cached ranking in seconds
    pub cache_ttl_secs: u64,
    /// Number of items in a generated ranking
    pub ranking_size: u32,
    /// Background sweep interval in seconds (0 disables the sweep)
    pub cleanup_interval: u64,
    /// Upper bound on how long a follower waits for the leader, if any
    pub wait_timeout_ms: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 80)
    /// - `DB_DELAY` - Simulated query latency in ms (default: 3000)
    /// - `CACHE_TTL` - Cached ranking lifetime in seconds (default: 10)
    /// - `RANKING_SIZE` - Items per ranking (default: 10)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds, 0 disables (default: 1)
    /// - `WAIT_TIMEOUT_MS` - Follower wait bound in ms (default: unbounded)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("PORT", defaults.server_port),
            db_delay_ms: env_or("DB_DELAY", defaults.db_delay_ms),
            cache_ttl_secs: env_or("CACHE_TTL", defaults.cache_ttl_secs),
            ranking_size: env_or("RANKING_SIZE", defaults.ranking_size),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            wait_timeout_ms: env::var("WAIT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn db_delay(&self) -> Duration {
        Duration::from_millis(self.db_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 80,
            db_delay_ms: 3000,
            cache_ttl_secs: 10,
            ranking_size: 10,
            cleanup_interval: 1,
            wait_timeout_ms: None,
        }
    }
}
