//! Domain model shared across the crate
//!
//! `WatchListEntry` doubles as the wire shape of an AniList media-list
//! entry and the record stored in the local cache, so its serde renames
//! follow the GraphQL field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved watch-list account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider-side numeric user id
    pub id: i64,
    /// Display name as the provider reports it
    pub name: String,
}

/// Watch status of a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchStatus {
    #[serde(rename = "CURRENT")]
    Watching,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "PLANNING")]
    Planning,
    #[serde(rename = "DROPPED")]
    Dropped,
    #[serde(rename = "PAUSED")]
    Paused,
    #[serde(rename = "REPEATING")]
    Rewatching,
}

impl WatchStatus {
    /// Statuses that feed the song pool. Only shows the user has
    /// watched or is watching qualify.
    pub fn is_eligible(self) -> bool {
        matches!(self, WatchStatus::Watching | WatchStatus::Completed)
    }
}

/// Title variants of an anime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
    pub user_preferred: Option<String>,
}

impl MediaTitle {
    fn pick<'a>(candidates: [Option<&'a String>; 3]) -> Option<&'a str> {
        candidates
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    /// Preferred title for song lookup: english, then romaji, then the
    /// user-preferred rendering.
    pub fn search_title(&self) -> Option<&str> {
        Self::pick([
            self.english.as_ref(),
            self.romaji.as_ref(),
            self.user_preferred.as_ref(),
        ])
    }

    /// Alternate title for the retry pass: romaji, then native.
    pub fn alternate_title(&self) -> Option<&str> {
        Self::pick([self.romaji.as_ref(), self.native.as_ref(), None])
    }

    /// Best title for display, falling back across all variants.
    pub fn display(&self) -> &str {
        self.search_title()
            .or_else(|| self.alternate_title())
            .unwrap_or("Unknown")
    }
}

/// Cover art URLs at the sizes the provider serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    pub extra_large: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
}

impl CoverImage {
    /// Largest available variant.
    pub fn best(&self) -> Option<&str> {
        self.extra_large
            .as_deref()
            .or(self.large.as_deref())
            .or(self.medium.as_deref())
    }
}

/// Anime metadata carried by a watch-list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub id: i64,
    #[serde(default)]
    pub title: MediaTitle,
    #[serde(default)]
    pub cover_image: CoverImage,
    #[serde(default)]
    pub genres: Vec<String>,
    pub popularity: Option<i64>,
    pub average_score: Option<i64>,
    pub season: Option<String>,
    pub season_year: Option<i32>,
    pub episodes: Option<i32>,
    pub format: Option<String>,
}

/// One entry of a user's anime list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchListEntry {
    pub status: WatchStatus,
    /// User score, 0 meaning unrated
    pub score: Option<f64>,
    pub media: MediaInfo,
}

impl WatchListEntry {
    /// Whether this entry may be drawn from when picking songs.
    pub fn is_eligible(&self) -> bool {
        self.status.is_eligible()
    }
}

/// Category of an anime song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SongType {
    Opening,
    Ending,
    Insert,
}

impl SongType {
    pub const ALL: [SongType; 3] = [SongType::Opening, SongType::Ending, SongType::Insert];

    /// Matches provider labels such as "Opening 1" or "Insert Song"
    /// case-insensitively.
    pub fn matches_label(self, label: &str) -> bool {
        let label = label.to_lowercase();
        let needle = match self {
            SongType::Opening => "opening",
            SongType::Ending => "ending",
            SongType::Insert => "insert",
        };
        label.contains(needle)
    }
}

/// An artist or composer credit on a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditedArtist {
    pub name: String,
    pub id: Option<i64>,
}

/// A playable track picked for the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    pub artist: String,
    /// Raw provider label, e.g. "Opening 2"
    pub type_label: String,
    pub anime_en_title: Option<String>,
    pub anime_jp_title: Option<String>,
    /// Broadcast season parsed from the provider's vintage string
    pub season: Option<String>,
    pub season_year: Option<i32>,
    /// Primary playable URL, absent when the provider has no audio rip
    pub audio_url: Option<String>,
    /// Ordered lower-quality fallbacks tried after the primary fails
    pub fallback_urls: Vec<String>,
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub artists: Vec<CreditedArtist>,
    #[serde(default)]
    pub composers: Vec<CreditedArtist>,
}

impl Song {
    /// Typed song category, when the provider label names one.
    pub fn song_type(&self) -> Option<SongType> {
        SongType::ALL
            .into_iter()
            .find(|t| t.matches_label(&self.type_label))
    }

    /// Primary URL followed by the fallbacks, in trial order.
    pub fn candidate_urls(&self) -> Vec<String> {
        self.audio_url
            .iter()
            .cloned()
            .chain(self.fallback_urls.iter().cloned())
            .collect()
    }
}

/// The watch-list entry a queued song was drawn from, slimmed for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAnime {
    pub media_id: i64,
    pub title: MediaTitle,
    pub cover_image: CoverImage,
    pub score: Option<f64>,
    pub season: Option<String>,
    pub season_year: Option<i32>,
}

impl From<&WatchListEntry> for SourceAnime {
    fn from(entry: &WatchListEntry) -> Self {
        SourceAnime {
            media_id: entry.media.id,
            title: entry.media.title.clone(),
            cover_image: entry.media.cover_image.clone(),
            score: entry.score,
            season: entry.media.season.clone(),
            season_year: entry.media.season_year,
        }
    }
}

/// One slot in the playback queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Engine-assigned id, unique for the lifetime of the engine
    pub id: u64,
    pub song: Song,
    pub source: SourceAnime,
    /// True when the item was added by a background extension
    pub preloaded: bool,
    pub added_at: DateTime<Utc>,
}
