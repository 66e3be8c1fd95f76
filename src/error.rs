//! Error taxonomy for the radio core
//!
//! Per-item resolution failures (`NoTitleAvailable`, `NoMatchingSongs`,
//! `ProviderUnavailable`) are recoverable: the queue engine logs them and
//! retries with a different anime. `UserNotFound`, `ListUnavailable` and
//! `RateLimited` block the session until the user retries.
//! `StorageUnavailable` is absorbed at the loader and degrades to a cache
//! miss; it never reaches the UI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The watch-list provider has no user matching the given name.
    #[error("user \"{0}\" was not found")]
    UserNotFound(String),

    /// Identity resolved but the list fetch failed.
    #[error("could not fetch the anime list for \"{username}\": {reason}")]
    ListUnavailable { username: String, reason: String },

    /// The watch-list provider answered 429; further calls are refused
    /// until the cooldown elapses.
    #[error("provider rate limit hit, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The selected anime carries no usable title in any language.
    #[error("anime {media_id} has no usable title")]
    NoTitleAvailable { media_id: i64 },

    /// The song provider returned results, but none of the requested types.
    #[error("no songs of the requested types for \"{title}\"")]
    NoMatchingSongs { title: String },

    /// The song provider could not be reached or answered with an error.
    #[error("song provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// An entire initialization batch yielded zero songs.
    #[error("could not resolve any songs to start the queue")]
    QueueInitializationFailed,

    /// The local list cache could not be read or written.
    #[error("local list cache unavailable")]
    StorageUnavailable(#[from] sqlx::Error),
}

impl Error {
    /// Whether the queue engine may swallow this failure and retry with
    /// another randomly chosen anime.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NoTitleAvailable { .. }
                | Error::NoMatchingSongs { .. }
                | Error::ProviderUnavailable(_)
        )
    }
}
