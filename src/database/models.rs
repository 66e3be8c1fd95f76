//! Stored-row models and cache policy

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::WatchListEntry;

/// Maximum number of cached lists before eviction kicks in.
pub const CACHE_CAPACITY: u64 = 100;
/// Occupancy fraction above which a cleanup pass runs.
pub const CLEANUP_THRESHOLD: f64 = 0.8;
/// Fraction of records removed by one cleanup pass.
pub const EVICT_FRACTION: f64 = 0.2;

/// Freshness policy applied when a list is written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStrategy {
    /// 4 h window, for users who update their list constantly
    Aggressive,
    /// 24 h window
    Normal,
    /// 72 h window, for mostly static lists
    Conservative,
    /// Window derived from list size: small lists change often
    Smart,
}

impl CacheStrategy {
    /// Freshness window in hours for a list of the given size.
    pub fn window_hours(self, entry_count: usize) -> i64 {
        match self {
            CacheStrategy::Aggressive => 4,
            CacheStrategy::Normal => 24,
            CacheStrategy::Conservative => 72,
            CacheStrategy::Smart => {
                if entry_count < 50 {
                    4
                } else if entry_count <= 500 {
                    12
                } else {
                    24
                }
            }
        }
    }
}

/// Raw `user_lists` row. Entries are stored as a JSON column.
#[derive(Debug, Clone, FromRow)]
pub struct DbListRow {
    pub user_id: i64,
    pub username: String,
    pub entries: String,
    pub entry_count: i64,
    pub fetched_at: i64,
    pub expires_at: i64,
    pub access_count: i64,
    pub last_accessed_at: i64,
}

impl DbListRow {
    /// Retention priority: frequently used young records score high,
    /// stale untouched records go negative and are evicted first.
    pub fn priority(&self, now: i64) -> f64 {
        let age_hours = ((now - self.fetched_at) as f64 / 3600.0).max(1.0);
        let idle_hours = (now - self.last_accessed_at) as f64 / 3600.0;
        self.access_count as f64 / age_hours * 1000.0 - idle_hours
    }

    /// Decode the JSON entries column into a usable record.
    pub fn decode(self) -> serde_json::Result<CachedList> {
        let entries: Vec<WatchListEntry> = serde_json::from_str(&self.entries)?;
        Ok(CachedList {
            user_id: self.user_id,
            username: self.username,
            entries,
            fetched_at: self.fetched_at,
            expires_at: self.expires_at,
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
        })
    }
}

/// A decoded cache record.
#[derive(Debug, Clone)]
pub struct CachedList {
    pub user_id: i64,
    pub username: String,
    pub entries: Vec<WatchListEntry>,
    /// Unix seconds the list was fetched from the provider
    pub fetched_at: i64,
    /// Unix seconds after which the record counts as stale
    pub expires_at: i64,
    pub access_count: i64,
    pub last_accessed_at: i64,
}

impl CachedList {
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at
    }
}
