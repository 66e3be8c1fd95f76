//! AnisongDB client
//!
//! One POST endpoint taking a filter payload and returning a flat track
//! array. Only anime-title search is used; song-type filtering happens
//! in the resolver.

use std::time::Duration;

use tracing::debug;

use crate::api::SongProvider;
use crate::api::model::{AnisongTrack, SearchRequest};
use crate::error::Error;

const BASE_URL: &str = "https://anisongdb.com/api";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Host serving the audio rips referenced by track metadata.
pub const MEDIA_BASE_URL: &str = "https://naedist.animemusicquiz.com";

/// Join a track's media path to the media host. Absolute URLs pass
/// through untouched.
pub fn media_url(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_owned()
    } else {
        format!("{}/{}", MEDIA_BASE_URL, path.trim_start_matches('/'))
    }
}

pub struct AnisongClient {
    http: reqwest::Client,
}

impl AnisongClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .unwrap_or_default();
        AnisongClient { http }
    }
}

impl Default for AnisongClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SongProvider for AnisongClient {
    async fn search_by_anime_title(
        &self,
        title: &str,
        partial: bool,
    ) -> Result<Vec<AnisongTrack>, Error> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Vec::new());
        }

        let payload = SearchRequest::for_anime(title, partial);
        let response = self
            .http
            .post(format!("{BASE_URL}/search_request"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ProviderUnavailable(format!(
                "anisongdb answered {}",
                response.status()
            )));
        }

        let tracks: Vec<AnisongTrack> = response
            .json()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;
        debug!(title, count = tracks.len(), "anisongdb search done");
        Ok(tracks)
    }
}
