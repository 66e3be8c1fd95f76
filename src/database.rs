//! Persistent list cache
//!
//! Fetched anime lists are kept in a local SQLite database so a user
//! switch or restart does not refetch from the rate-limited provider.
//! `ListCache` wraps the pool and exposes the cache operations; raw
//! queries live in `ops::`.

pub mod models;
pub mod ops;
pub mod repository;
pub mod schema;

pub use models::{CacheStrategy, CachedList};
pub use repository::ListCache;
