//! Endless anime-song radio engine.
//!
//! Given an AniList username, the crate loads the user's anime list
//! (served from a local SQLite cache when fresh), resolves random
//! openings/endings/inserts for those shows through AnisongDB, and
//! maintains an ever-growing playback queue plus the session state of
//! whatever audio backend the embedding application brings.
//!
//! Typical wiring:
//!
//! ```no_run
//! use aniradio::{
//!     AnilistClient, AnisongClient, ListCache, ListLoader, QueueEngine,
//!     SongResolver, queue,
//! };
//!
//! # async fn run() -> Result<(), aniradio::Error> {
//! let cache = ListCache::open(&ListCache::default_path()).await?;
//! let loader = ListLoader::new(AnilistClient::new(), cache);
//! let mut resolver = SongResolver::new(AnisongClient::new());
//! let mut engine = QueueEngine::new();
//!
//! let list = loader.load("some-user").await?;
//! engine
//!     .initialize(&mut resolver, &list.entries, queue::INITIAL_BATCH)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod database;
pub mod error;
pub mod loader;
pub mod models;
pub mod queue;
pub mod resolver;
pub mod session;

pub use api::{AnilistClient, AnisongClient, SongProvider, WatchListProvider};
pub use database::{CacheStrategy, CachedList, ListCache};
pub use error::Error;
pub use loader::{ListLoader, LoadedList};
pub use models::{
    QueueItem, Song, SongType, SourceAnime, UserIdentity, WatchListEntry, WatchStatus,
};
pub use queue::{QueueEngine, QueueStats, SelectionConfig, SelectionMode};
pub use resolver::SongResolver;
pub use session::{
    AudioTransport, PlaybackInfo, PlaybackSession, RepeatMode, SessionRequest, TransportEvent,
};
