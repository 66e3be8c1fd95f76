//! Song resolver
//!
//! Turns one watch-list entry into one playable song: search the song
//! provider by the entry's preferred title, retry once with the
//! alternate title, filter by requested song types, then pick uniformly
//! at random.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::api::SongProvider;
use crate::api::anisong::media_url;
use crate::api::model::AnisongTrack;
use crate::error::Error;
use crate::models::{Song, SongType, WatchListEntry};

pub struct SongResolver<P> {
    provider: P,
    rng: StdRng,
}

impl<P: SongProvider> SongResolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_rng(provider, StdRng::from_os_rng())
    }

    /// Deterministic constructor for tests.
    pub fn with_rng(provider: P, rng: StdRng) -> Self {
        SongResolver { provider, rng }
    }

    /// Resolve one song of an allowed type for the given entry.
    pub async fn resolve(
        &mut self,
        entry: &WatchListEntry,
        allowed: &[SongType],
    ) -> Result<Song, Error> {
        let title = &entry.media.title;
        let primary = title.search_title();
        let alternate = title.alternate_title();
        if primary.is_none() && alternate.is_none() {
            return Err(Error::NoTitleAvailable {
                media_id: entry.media.id,
            });
        }

        let mut tracks = match primary {
            Some(t) => self.provider.search_by_anime_title(t, true).await?,
            None => Vec::new(),
        };
        if tracks.is_empty() {
            if let Some(alt) = alternate
                && primary != Some(alt)
            {
                debug!(title = alt, "no results for preferred title, retrying alternate");
                tracks = self.provider.search_by_anime_title(alt, true).await?;
            }
        }

        let matching: Vec<AnisongTrack> = tracks
            .into_iter()
            .filter(|t| allowed.iter().any(|ty| ty.matches_label(&t.song_type)))
            .collect();
        if matching.is_empty() {
            warn!(media_id = entry.media.id, "no matching songs");
            return Err(Error::NoMatchingSongs {
                title: title.display().to_owned(),
            });
        }

        let pick = self.rng.random_range(0..matching.len());
        let track = &matching[pick];
        debug!(
            song = %track.song_name,
            artist = %track.song_artist,
            kind = %track.song_type,
            "song resolved"
        );
        Ok(build_song(track))
    }
}

fn build_song(track: &AnisongTrack) -> Song {
    let (season, season_year) = track.vintage_parts();
    Song {
        name: track.song_name.clone(),
        artist: track.song_artist.clone(),
        type_label: track.song_type.clone(),
        anime_en_title: track.anime_en_name.clone(),
        anime_jp_title: track.anime_jp_name.clone(),
        season,
        season_year,
        audio_url: track.audio.as_deref().map(media_url),
        fallback_urls: [track.mq.as_deref(), track.hq.as_deref()]
            .into_iter()
            .flatten()
            .map(media_url)
            .collect(),
        duration_secs: track.song_length,
        artists: track.artists.iter().cloned().map(|a| a.into_credit()).collect(),
        composers: track
            .composers
            .iter()
            .cloned()
            .map(|a| a.into_credit())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::{AnisongArtist, LinkedIds};
    use crate::models::{MediaInfo, MediaTitle, WatchStatus};
    use std::collections::HashMap;

    fn track(name: &str, song_type: &str) -> AnisongTrack {
        AnisongTrack {
            ann_song_id: None,
            song_name: name.to_owned(),
            song_artist: "artist".to_owned(),
            song_type: song_type.to_owned(),
            anime_en_name: Some("EN".into()),
            anime_jp_name: Some("JP".into()),
            anime_vintage: Some("Spring 2021".into()),
            song_length: Some(90.0),
            audio: Some(format!("rips/{name}.mp3")),
            mq: Some(format!("rips/{name}.mq.webm")),
            hq: None,
            artists: vec![AnisongArtist {
                id: Some(1),
                names: vec!["artist".into()],
            }],
            composers: vec![],
            linked_ids: LinkedIds::default(),
        }
    }

    fn entry(en: Option<&str>, romaji: Option<&str>) -> WatchListEntry {
        WatchListEntry {
            status: WatchStatus::Watching,
            score: None,
            media: MediaInfo {
                id: 99,
                title: MediaTitle {
                    english: en.map(String::from),
                    romaji: romaji.map(String::from),
                    ..Default::default()
                },
                cover_image: Default::default(),
                genres: vec![],
                popularity: None,
                average_score: None,
                season: None,
                season_year: None,
                episodes: None,
                format: None,
            },
        }
    }

    #[derive(Default)]
    struct FakeSongs {
        by_title: HashMap<String, Vec<AnisongTrack>>,
    }

    impl SongProvider for FakeSongs {
        async fn search_by_anime_title(
            &self,
            title: &str,
            _partial: bool,
        ) -> Result<Vec<AnisongTrack>, Error> {
            Ok(self.by_title.get(title).cloned().unwrap_or_default())
        }
    }

    fn resolver(by_title: HashMap<String, Vec<AnisongTrack>>) -> SongResolver<FakeSongs> {
        SongResolver::with_rng(FakeSongs { by_title }, StdRng::seed_from_u64(1))
    }

    #[tokio::test]
    async fn resolves_from_preferred_title() {
        let mut r = resolver(HashMap::from([(
            "EN Title".to_owned(),
            vec![track("op", "Opening 1")],
        )]));
        let song = r
            .resolve(&entry(Some("EN Title"), Some("Romaji")), &SongType::ALL)
            .await
            .unwrap();
        assert_eq!(song.name, "op");
        assert_eq!(
            song.audio_url.as_deref(),
            Some("https://naedist.animemusicquiz.com/rips/op.mp3")
        );
        assert_eq!(song.fallback_urls.len(), 1);
        assert_eq!(song.season.as_deref(), Some("Spring"));
        assert_eq!(song.season_year, Some(2021));
    }

    #[tokio::test]
    async fn retries_alternate_title_when_preferred_is_empty() {
        let mut r = resolver(HashMap::from([(
            "Romaji".to_owned(),
            vec![track("ed", "Ending 2")],
        )]));
        let song = r
            .resolve(&entry(Some("EN Title"), Some("Romaji")), &SongType::ALL)
            .await
            .unwrap();
        assert_eq!(song.name, "ed");
    }

    #[tokio::test]
    async fn type_filter_rejects_unwanted_kinds() {
        let mut r = resolver(HashMap::from([(
            "EN Title".to_owned(),
            vec![track("op", "Opening 1"), track("ins", "Insert Song")],
        )]));
        let song = r
            .resolve(&entry(Some("EN Title"), None), &[SongType::Insert])
            .await
            .unwrap();
        assert_eq!(song.name, "ins");
    }

    #[tokio::test]
    async fn no_results_anywhere_is_no_matching_songs() {
        let mut r = resolver(HashMap::new());
        let err = r
            .resolve(&entry(Some("EN Title"), Some("Romaji")), &SongType::ALL)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoMatchingSongs { .. }));
    }

    #[tokio::test]
    async fn entry_without_any_title_fails_fast() {
        let mut r = resolver(HashMap::new());
        let err = r.resolve(&entry(None, None), &SongType::ALL).await.unwrap_err();
        assert!(matches!(err, Error::NoTitleAvailable { media_id: 99 }));
    }

    #[tokio::test]
    async fn seeded_rng_makes_the_pick_deterministic() {
        let tracks = vec![
            track("a", "Opening 1"),
            track("b", "Opening 2"),
            track("c", "Opening 3"),
        ];
        let mut r1 = resolver(HashMap::from([("EN Title".to_owned(), tracks.clone())]));
        let mut r2 = resolver(HashMap::from([("EN Title".to_owned(), tracks)]));
        let e = entry(Some("EN Title"), None);
        let s1 = r1.resolve(&e, &SongType::ALL).await.unwrap();
        let s2 = r2.resolve(&e, &SongType::ALL).await.unwrap();
        assert_eq!(s1.name, s2.name);
    }
}
