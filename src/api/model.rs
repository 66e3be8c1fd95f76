//! Wire models for the two remote providers
//!
//! AniList speaks GraphQL over a single POST endpoint; the response
//! envelope and the list/identity payloads live here. AnisongDB is a
//! plain REST search endpoint that takes a large filter payload and
//! returns a flat track array.

use serde::{Deserialize, Serialize};

use crate::models::{CreditedArtist, UserIdentity, WatchListEntry};

// ============ AniList GraphQL ============

/// Response envelope: GraphQL reports failures inside a 200 body.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

impl<T> GraphQlResponse<T> {
    /// First error message, when the provider reported any.
    pub fn error_message(&self) -> Option<&str> {
        self.errors
            .as_deref()
            .and_then(|errs| errs.first())
            .map(|e| e.message.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct UserSearchData {
    #[serde(rename = "User")]
    pub user: Option<UserIdentity>,
}

#[derive(Debug, Deserialize)]
pub struct MediaListData {
    #[serde(rename = "MediaListCollection")]
    pub collection: Option<MediaListCollection>,
}

#[derive(Debug, Deserialize)]
pub struct MediaListCollection {
    #[serde(default)]
    pub lists: Vec<MediaListGroup>,
}

/// One status group ("Watching", "Completed", ...) of a user's list.
#[derive(Debug, Deserialize)]
pub struct MediaListGroup {
    #[serde(default)]
    pub entries: Vec<WatchListEntry>,
}

impl MediaListData {
    /// Flatten all status groups into a single entry list.
    pub fn into_entries(self) -> Vec<WatchListEntry> {
        self.collection
            .map(|c| c.lists.into_iter().flat_map(|g| g.entries).collect())
            .unwrap_or_default()
    }
}

// ============ AnisongDB ============

#[derive(Debug, Serialize)]
pub struct TextFilter {
    pub search: String,
    pub partial_match: bool,
}

#[derive(Debug, Serialize)]
pub struct ArtistFilter {
    pub search: String,
    pub partial_match: bool,
    pub group_granularity: u32,
    pub max_other_artist: u32,
}

#[derive(Debug, Serialize)]
pub struct ComposerFilter {
    pub search: String,
    pub partial_match: bool,
    pub arrangement: bool,
}

/// Search payload for `/search_request`. Every song-type and broadcast
/// flag is enabled; filtering happens client-side after the fetch.
#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub anime_search_filter: TextFilter,
    pub song_name_search_filter: TextFilter,
    pub artist_search_filter: ArtistFilter,
    pub composer_search_filter: ComposerFilter,
    pub and_logic: bool,
    pub ignore_duplicate: bool,
    pub opening_filter: bool,
    pub ending_filter: bool,
    pub insert_filter: bool,
    pub normal_broadcast: bool,
    pub dub: bool,
    pub rebroadcast: bool,
    pub standard: bool,
    pub instrumental: bool,
    pub chanting: bool,
    pub character: bool,
}

impl SearchRequest {
    /// Build an anime-title search with all other filters blank.
    pub fn for_anime(title: &str, partial_match: bool) -> Self {
        SearchRequest {
            anime_search_filter: TextFilter {
                search: title.to_owned(),
                partial_match,
            },
            song_name_search_filter: TextFilter {
                search: String::new(),
                partial_match: false,
            },
            artist_search_filter: ArtistFilter {
                search: String::new(),
                partial_match: false,
                group_granularity: 0,
                max_other_artist: 99,
            },
            composer_search_filter: ComposerFilter {
                search: String::new(),
                partial_match: false,
                arrangement: true,
            },
            and_logic: false,
            ignore_duplicate: false,
            opening_filter: true,
            ending_filter: true,
            insert_filter: true,
            normal_broadcast: true,
            dub: true,
            rebroadcast: true,
            standard: true,
            instrumental: true,
            chanting: true,
            character: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnisongArtist {
    pub id: Option<i64>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl AnisongArtist {
    pub fn into_credit(self) -> CreditedArtist {
        CreditedArtist {
            name: self.names.into_iter().next().unwrap_or_default(),
            id: self.id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkedIds {
    pub anilist: Option<i64>,
}

/// One track as AnisongDB returns it. Media paths in `audio`/`MQ`/`HQ`
/// are relative to the media host.
#[derive(Debug, Clone, Deserialize)]
pub struct AnisongTrack {
    #[serde(rename = "annSongId")]
    pub ann_song_id: Option<i64>,
    #[serde(rename = "songName")]
    pub song_name: String,
    #[serde(rename = "songArtist")]
    pub song_artist: String,
    /// Label such as "Opening 1", "Ending 2", "Insert Song"
    #[serde(rename = "songType")]
    pub song_type: String,
    #[serde(rename = "animeENName")]
    pub anime_en_name: Option<String>,
    #[serde(rename = "animeJPName")]
    pub anime_jp_name: Option<String>,
    /// Broadcast vintage, e.g. "Fall 2023"
    #[serde(rename = "animeVintage")]
    pub anime_vintage: Option<String>,
    #[serde(rename = "songLength")]
    pub song_length: Option<f64>,
    pub audio: Option<String>,
    #[serde(rename = "MQ")]
    pub mq: Option<String>,
    #[serde(rename = "HQ")]
    pub hq: Option<String>,
    #[serde(default)]
    pub artists: Vec<AnisongArtist>,
    #[serde(default)]
    pub composers: Vec<AnisongArtist>,
    #[serde(default)]
    pub linked_ids: LinkedIds,
}

impl AnisongTrack {
    /// Split "Fall 2023" into season name and year.
    pub fn vintage_parts(&self) -> (Option<String>, Option<i32>) {
        let Some(vintage) = self.anime_vintage.as_deref() else {
            return (None, None);
        };
        let mut words = vintage.split_whitespace();
        let season = words.next().map(str::to_owned);
        let year = words.next().and_then(|w| w.parse().ok());
        (season, year)
    }
}
