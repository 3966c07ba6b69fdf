//! Cache Statistics Module
//!
//! Counts how requests were served: from cache, by leading a computation,
//! or by sharing one.

use std::sync::atomic::{AtomicU64, Ordering};

// == Cache Stats ==
/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from a valid cache entry
    pub hits: u64,
    /// Requests that led a fresh computation
    pub misses: u64,
    /// Requests that joined a computation already in flight
    pub shared: u64,
    /// Requests that ended with a computation failure
    pub failures: u64,
    /// Times the expensive producer actually ran
    pub producer_runs: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Fraction of successful requests served from cache, 0.0 with no traffic.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.shared;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters updated concurrently by request handlers.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    shared: AtomicU64,
    failures: AtomicU64,
    producer_runs: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_shared(&self) {
        self.shared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_producer_run(&self) {
        self.producer_runs.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the current counter values.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            shared: self.shared.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            producer_runs: self.producer_runs.load(Ordering::Relaxed),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_stats_new() {
        let stats = StatsRecorder::new().snapshot();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_counts_shared_as_cold() {
        let recorder = StatsRecorder::new();
        recorder.record_hit();
        recorder.record_miss();
        recorder.record_shared();
        recorder.record_shared();
        assert_eq!(recorder.snapshot().hit_rate(), 0.25);
    }

    #[test]
    fn test_failures_do_not_affect_hit_rate() {
        let recorder = StatsRecorder::new();
        recorder.record_hit();
        recorder.record_failure();
        let stats = recorder.snapshot();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.hit_rate(), 1.0);
    }

    #[test]
    fn test_concurrent_recording() {
        let recorder = Arc::new(StatsRecorder::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        recorder.record_shared();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(recorder.snapshot().shared, 8000);
    }
}
