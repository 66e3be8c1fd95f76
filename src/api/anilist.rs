//! AniList GraphQL client
//!
//! Single POST endpoint; identity and list queries share one request
//! path. AniList rate-limits aggressively, so a 429 arms a process-local
//! cooldown gate that refuses further calls for a minute instead of
//! hammering the API.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::api::WatchListProvider;
use crate::api::model::{GraphQlResponse, MediaListData, UserSearchData};
use crate::error::Error;
use crate::models::{UserIdentity, WatchListEntry};

const BASE_URL: &str = "https://graphql.anilist.co";
const TIMEOUT: Duration = Duration::from_secs(30);
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

const USER_SEARCH_QUERY: &str = r#"
query ($search: String) {
  User(search: $search) {
    id
    name
  }
}
"#;

const MEDIA_LIST_QUERY: &str = r#"
query ($userName: String) {
  MediaListCollection(userName: $userName, type: ANIME) {
    lists {
      entries {
        status
        score
        media {
          id
          title { romaji english native userPreferred }
          coverImage { extraLarge large medium }
          genres
          popularity
          averageScore
          season
          seasonYear
          episodes
          format
        }
      }
    }
  }
}
"#;

pub struct AnilistClient {
    http: reqwest::Client,
    cooldown_until: Mutex<Option<Instant>>,
}

impl AnilistClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .unwrap_or_default();
        AnilistClient {
            http,
            cooldown_until: Mutex::new(None),
        }
    }

    /// Seconds left on the cooldown, if the gate is armed.
    fn cooldown_remaining(&self) -> Option<u64> {
        let mut gate = self.cooldown_until.lock();
        match *gate {
            Some(until) => {
                let now = Instant::now();
                if now < until {
                    Some((until - now).as_secs().max(1))
                } else {
                    *gate = None;
                    None
                }
            }
            None => None,
        }
    }

    fn arm_cooldown(&self) {
        *self.cooldown_until.lock() = Some(Instant::now() + RATE_LIMIT_COOLDOWN);
        warn!(
            "anilist rate limit hit, pausing requests for {}s",
            RATE_LIMIT_COOLDOWN.as_secs()
        );
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, Error> {
        if let Some(secs) = self.cooldown_remaining() {
            return Err(Error::RateLimited {
                retry_after_secs: secs,
            });
        }

        let response = self
            .http
            .post(BASE_URL)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.arm_cooldown();
            return Err(Error::RateLimited {
                retry_after_secs: RATE_LIMIT_COOLDOWN.as_secs(),
            });
        }
        if !response.status().is_success() {
            return Err(Error::ProviderUnavailable(format!(
                "anilist answered {}",
                response.status()
            )));
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        if let Some(message) = envelope.error_message() {
            return Err(Error::ProviderUnavailable(message.to_owned()));
        }
        envelope
            .data
            .ok_or_else(|| Error::ProviderUnavailable("empty graphql response".into()))
    }
}

impl Default for AnilistClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchListProvider for AnilistClient {
    async fn search_identity(&self, username: &str) -> Result<Option<UserIdentity>, Error> {
        debug!(username, "searching anilist identity");
        match self
            .execute::<UserSearchData>(USER_SEARCH_QUERY, json!({ "search": username }))
            .await
        {
            Ok(data) => Ok(data.user),
            // AniList reports an unknown user as a GraphQL "Not Found"
            // error rather than a null User.
            Err(Error::ProviderUnavailable(msg)) if msg.to_lowercase().contains("not found") => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_list(&self, username: &str) -> Result<Vec<WatchListEntry>, Error> {
        debug!(username, "fetching anilist media list");
        let data = self
            .execute::<MediaListData>(MEDIA_LIST_QUERY, json!({ "userName": username }))
            .await?;
        let entries = data.into_entries();
        debug!(count = entries.len(), "anilist list fetched");
        Ok(entries)
    }
}
