//! Cache repository
//!
//! `ListCache` owns the SQLite pool and exposes the cache operations
//! the loader needs. All sqlx failures surface as
//! `Error::StorageUnavailable`; callers that can degrade gracefully
//! treat them as cache misses.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::{debug, info, warn};

use crate::database::models::{
    CACHE_CAPACITY, CLEANUP_THRESHOLD, CacheStrategy, CachedList, EVICT_FRACTION,
};
use crate::database::{ops, schema};
use crate::error::Error;
use crate::models::WatchListEntry;

#[derive(Clone)]
pub struct ListCache {
    pool: SqlitePool,
}

impl ListCache {
    /// Open (or create) the cache database at the given path and run
    /// migrations.
    pub async fn open(path: &Path) -> Result<Self, Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::StorageUnavailable(e.into()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        schema::run_migrations(&pool).await?;
        info!(path = %path.display(), "list cache opened");
        Ok(ListCache { pool })
    }

    /// Default location under the platform data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aniradio")
            .join("lists.db")
    }

    /// Whether a usable record exists for the user. With
    /// `max_age_hours` the check runs against `fetched_at` plus that
    /// window instead of the stored expiry.
    pub async fn has(&self, user_id: i64, max_age_hours: Option<i64>) -> Result<bool, Error> {
        let Some(row) = ops::lists::get(&self.pool, user_id).await? else {
            return Ok(false);
        };
        let now = Utc::now().timestamp();
        let fresh = match max_age_hours {
            Some(hours) => now < row.fetched_at + hours * 3600,
            None => now < row.expires_at,
        };
        Ok(fresh)
    }

    /// Fetch a record and count the access. A corrupted entries column
    /// drops the record and reads as a miss.
    pub async fn get(&self, user_id: i64) -> Result<Option<CachedList>, Error> {
        let Some(row) = ops::lists::get(&self.pool, user_id).await? else {
            return Ok(None);
        };
        ops::lists::touch_access(&self.pool, user_id, Utc::now().timestamp()).await?;
        match row.decode() {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(user_id, error = %e, "corrupted cache record, dropping");
                ops::lists::delete(&self.pool, user_id).await?;
                Ok(None)
            }
        }
    }

    /// Store a fetched list under the given strategy's freshness
    /// window, then run the capacity check.
    pub async fn put(
        &self,
        user_id: i64,
        username: &str,
        entries: &[WatchListEntry],
        strategy: CacheStrategy,
    ) -> Result<(), Error> {
        let json = serde_json::to_string(entries)
            .map_err(|e| Error::StorageUnavailable(sqlx::Error::Encode(Box::new(e))))?;
        let now = Utc::now().timestamp();
        let expires_at = now + strategy.window_hours(entries.len()) * 3600;

        ops::lists::upsert(
            &self.pool,
            user_id,
            username,
            &json,
            entries.len() as i64,
            now,
            expires_at,
        )
        .await?;
        debug!(user_id, entries = entries.len(), "list cached");

        self.evict_if_crowded().await
    }

    /// Look a record up by username, exact match first.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<CachedList>, Error> {
        let Some(row) = ops::lists::find_by_username(&self.pool, username).await? else {
            return Ok(None);
        };
        let user_id = row.user_id;
        ops::lists::touch_access(&self.pool, user_id, Utc::now().timestamp()).await?;
        match row.decode() {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(user_id, error = %e, "corrupted cache record, dropping");
                ops::lists::delete(&self.pool, user_id).await?;
                Ok(None)
            }
        }
    }

    pub async fn clear(&self) -> Result<(), Error> {
        ops::lists::clear(&self.pool).await?;
        Ok(())
    }

    pub async fn len(&self) -> Result<u64, Error> {
        Ok(ops::lists::count(&self.pool).await?)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }

    /// Drop the lowest-priority records when the cache is over the
    /// cleanup threshold.
    pub async fn evict_if_crowded(&self) -> Result<(), Error> {
        let count = ops::lists::count(&self.pool).await?;
        if (count as f64) <= CACHE_CAPACITY as f64 * CLEANUP_THRESHOLD {
            return Ok(());
        }

        let now = Utc::now().timestamp();
        let mut rows = ops::lists::all_rows(&self.pool).await?;
        rows.sort_by(|a, b| {
            a.priority(now)
                .partial_cmp(&b.priority(now))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let evict = ((count as f64 * EVICT_FRACTION).ceil() as usize).max(1);
        for row in rows.iter().take(evict) {
            ops::lists::delete(&self.pool, row.user_id).await?;
        }
        info!(evicted = evict, remaining = count as usize - evict, "cache cleanup");
        Ok(())
    }
}
