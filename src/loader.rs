//! List loader
//!
//! Resolves a username to an identity, then serves the user's eligible
//! anime list from the cache or the provider. Storage failures degrade
//! to cache misses; the load only fails when the provider itself does.

use tracing::{debug, info, warn};

use crate::api::WatchListProvider;
use crate::database::{CacheStrategy, ListCache};
use crate::error::Error;
use crate::models::{UserIdentity, WatchListEntry};

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedList {
    pub identity: UserIdentity,
    /// Eligible entries only (watching/completed)
    pub entries: Vec<WatchListEntry>,
    pub from_cache: bool,
}

pub struct ListLoader<P> {
    provider: P,
    cache: ListCache,
    strategy: CacheStrategy,
}

impl<P: WatchListProvider> ListLoader<P> {
    pub fn new(provider: P, cache: ListCache) -> Self {
        ListLoader {
            provider,
            cache,
            strategy: CacheStrategy::Smart,
        }
    }

    pub fn with_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Load a user's eligible anime list, hitting the cache first.
    pub async fn load(&self, username: &str) -> Result<LoadedList, Error> {
        let username = username.trim();

        let identity = self
            .provider
            .search_identity(username)
            .await?
            .ok_or_else(|| Error::UserNotFound(username.to_owned()))?;
        debug!(user_id = identity.id, name = %identity.name, "identity resolved");

        if let Some(cached) = self.cached_entries(identity.id).await {
            info!(user_id = identity.id, entries = cached.len(), "cache hit");
            return Ok(LoadedList {
                identity,
                entries: cached,
                from_cache: true,
            });
        }

        let raw = self
            .provider
            .fetch_list(&identity.name)
            .await
            .map_err(|e| match e {
                Error::RateLimited { .. } => e,
                other => Error::ListUnavailable {
                    username: identity.name.clone(),
                    reason: other.to_string(),
                },
            })?;

        let entries: Vec<WatchListEntry> = raw.into_iter().filter(|e| e.is_eligible()).collect();
        info!(user_id = identity.id, entries = entries.len(), "list fetched");

        if let Err(e) = self
            .cache
            .put(identity.id, &identity.name, &entries, self.strategy)
            .await
        {
            warn!(error = %e, "could not cache the list, continuing");
        }

        Ok(LoadedList {
            identity,
            entries,
            from_cache: false,
        })
    }

    /// Fresh cached entries for the user, or `None`. Storage errors are
    /// logged and read as a miss.
    async fn cached_entries(&self, user_id: i64) -> Option<Vec<WatchListEntry>> {
        match self.cache.has(user_id, None).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!(error = %e, "cache check failed, treating as miss");
                return None;
            }
        }
        match self.cache.get(user_id).await {
            Ok(Some(record)) => Some(record.entries),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }
}
