//! Remote providers
//!
//! Two HTTP backends feed the radio: AniList (GraphQL) for user
//! identities and anime lists, AnisongDB (REST) for song metadata.
//! Both are exposed behind small async traits so the loader, resolver
//! and tests can swap in stubs.

use crate::error::Error;
use crate::models::{UserIdentity, WatchListEntry};

pub mod anilist;
pub mod anisong;
pub mod model;

pub use anilist::AnilistClient;
pub use anisong::AnisongClient;
pub use model::AnisongTrack;

/// Source of user identities and watch lists.
pub trait WatchListProvider {
    /// Look up an account by name. `Ok(None)` means the provider knows
    /// no such user.
    fn search_identity(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserIdentity>, Error>> + Send;

    /// Fetch the full anime list of a user, flattened across list
    /// groups and unfiltered.
    fn fetch_list(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<WatchListEntry>, Error>> + Send;
}

/// Source of song metadata for an anime title.
pub trait SongProvider {
    /// Search tracks by anime title. A blank title yields an empty
    /// result without a network round trip.
    fn search_by_anime_title(
        &self,
        title: &str,
        partial: bool,
    ) -> impl Future<Output = Result<Vec<AnisongTrack>, Error>> + Send;
}
