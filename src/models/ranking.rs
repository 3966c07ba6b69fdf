//! Ranking payload
//!
//! The value computed by the expensive query and cached in serialized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingItem {
    /// 1-based position
    pub rank: u32,
    pub name: String,
    pub score: u32,
}

/// A ranked list plus the time it was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub items: Vec<RankingItem>,
    pub updated_at: DateTime<Utc>,
}

impl Ranking {
    /// Creates a ranking stamped with the current time.
    pub fn new(items: Vec<RankingItem>) -> Self {
        Self {
            items,
            updated_at: Utc::now(),
        }
    }
}
