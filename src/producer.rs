//! Expensive Producer
//!
//! The costly computation behind the cache. The coordinator only ever calls
//! it through the deduplication group.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::ComputeError;
use crate::models::{Ranking, RankingItem};

/// Computes a fresh ranking for a cache key.
///
/// Implementations are assumed deterministic enough that one run per key
/// can stand in for every concurrent caller.
#[async_trait]
pub trait Producer: Send + Sync + 'static {
    async fn produce(&self, key: &str) -> Result<Ranking, ComputeError>;
}

// == Simulated Ranking DB ==
/// Stand-in for a slow ranking query: sleeps, then returns random rows.
#[derive(Debug, Clone)]
pub struct SimulatedRankingDb {
    delay: Duration,
    size: u32,
}

impl SimulatedRankingDb {
    pub fn new(delay: Duration, size: u32) -> Self {
        Self { delay, size }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.db_delay(), config.ranking_size)
    }

    fn generate(&self) -> Ranking {
        let mut rng = rand::rng();
        let items = (1..=self.size)
            .map(|rank| RankingItem {
                rank,
                name: format!("User{}", rng.random_range(0..1000)),
                score: rng.random_range(0..10_000),
            })
            .collect();
        Ranking::new(items)
    }
}

#[async_trait]
impl Producer for SimulatedRankingDb {
    async fn produce(&self, _key: &str) -> Result<Ranking, ComputeError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_db_waits_for_delay() {
        let db = SimulatedRankingDb::new(Duration::from_secs(3), 10);
        let start = tokio::time::Instant::now();

        let ranking = db.produce("ranking").await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(ranking.items.len(), 10);
    }

    #[tokio::test]
    async fn test_simulated_db_ranks_are_sequential() {
        let db = SimulatedRankingDb::new(Duration::ZERO, 5);
        let ranking = db.produce("ranking").await.unwrap();

        let ranks: Vec<u32> = ranking.items.iter().map(|item| item.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        for item in &ranking.items {
            assert!(item.name.starts_with("User"));
            assert!(item.score < 10_000);
        }
    }
}
