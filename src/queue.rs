//! Queue engine
//!
//! Owns the forward queue, the playback history and the current
//! position. Forward items are never removed by navigation: `next`
//! moves the pointer ahead and leaves a copy of the departed song in
//! history, so the visible playlist stays stable while the session
//! walks through it.
//!
//! The engine is single-owner and lock-free. Long-running fills
//! (`initialize`, `extend`) carry an explicit in-flight guard, and
//! low-water marks raise a prefetch request the embedding app drains
//! with [`QueueEngine::take_prefetch_request`] and serves by calling
//! [`QueueEngine::extend`].

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::api::SongProvider;
use crate::error::Error;
use crate::models::{QueueItem, Song, SongType, SourceAnime, WatchListEntry};
use crate::resolver::SongResolver;

/// Songs resolved by the first fill.
pub const INITIAL_BATCH: usize = 5;
/// Songs added per background extension.
pub const PRELOAD_BATCH: usize = 6;
/// Remaining-song count at which a prefetch is requested.
pub const PREFETCH_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpState {
    Idle,
    InFlight,
}

/// How entries are drawn from the eligible pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Uniform,
    /// Bias the draw towards entries the user scored higher.
    ScoreWeighted,
}

#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub allowed_types: Vec<SongType>,
    /// Entries scored below this are skipped; unrated counts as 0.
    pub min_score: Option<f64>,
    pub mode: SelectionMode,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            allowed_types: SongType::ALL.to_vec(),
            min_score: None,
            mode: SelectionMode::Uniform,
        }
    }
}

/// Snapshot of queue shape for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub total: usize,
    /// 1-based position of the current song, 0 when nothing plays
    pub position: usize,
    pub remaining: usize,
    pub history_len: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

pub struct QueueEngine {
    forward: Vec<QueueItem>,
    history: Vec<QueueItem>,
    current_index: Option<usize>,
    config: SelectionConfig,
    rng: StdRng,
    next_id: u64,
    /// Bumped on user switch; in-flight fills from the previous user
    /// check it before committing.
    epoch: u64,
    init_state: OpState,
    preload_state: OpState,
    initialized: bool,
    error: Option<String>,
    prefetch_requested: bool,
}

impl QueueEngine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic constructor for tests.
    pub fn with_rng(rng: StdRng) -> Self {
        QueueEngine {
            forward: Vec::new(),
            history: Vec::new(),
            current_index: None,
            config: SelectionConfig::default(),
            rng,
            next_id: 0,
            epoch: 0,
            init_state: OpState::Idle,
            preload_state: OpState::Idle,
            initialized: false,
            error: None,
            prefetch_requested: false,
        }
    }

    pub fn with_config(mut self, config: SelectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_config(&mut self, config: SelectionConfig) {
        self.config = config;
    }

    // ============ Filling ============

    /// First fill. A no-op when already initialized, already filling,
    /// or the queue holds items. On success the current song is the
    /// first item and a prefetch request is raised.
    pub async fn initialize<P: SongProvider>(
        &mut self,
        resolver: &mut SongResolver<P>,
        entries: &[WatchListEntry],
        batch_size: usize,
    ) -> Result<(), Error> {
        if self.init_state == OpState::InFlight || self.initialized || !self.forward.is_empty() {
            debug!("queue initialize skipped, already running or filled");
            return Ok(());
        }
        self.init_state = OpState::InFlight;
        self.error = None;
        let epoch = self.epoch;

        let batch = self.resolve_batch(resolver, entries, batch_size).await;

        self.init_state = OpState::Idle;
        if self.epoch != epoch {
            debug!("discarding stale initialize batch after user switch");
            return Ok(());
        }
        if batch.is_empty() {
            let message = "could not resolve any songs to start the queue".to_owned();
            warn!("{message}");
            self.error = Some(message);
            return Err(Error::QueueInitializationFailed);
        }

        let count = batch.len();
        for (song, source) in batch {
            self.push_item(song, source, false);
        }
        self.current_index = Some(0);
        self.initialized = true;
        self.prefetch_requested = true;
        info!(songs = count, "queue initialized");
        Ok(())
    }

    /// Background extension. Appends up to `count` preloaded songs and
    /// reports how many landed; resolution failures never surface.
    pub async fn extend<P: SongProvider>(
        &mut self,
        resolver: &mut SongResolver<P>,
        entries: &[WatchListEntry],
        count: usize,
    ) -> usize {
        if self.preload_state == OpState::InFlight {
            debug!("queue extend skipped, already running");
            return 0;
        }
        self.preload_state = OpState::InFlight;
        let epoch = self.epoch;

        let batch = self.resolve_batch(resolver, entries, count).await;

        self.preload_state = OpState::Idle;
        if self.epoch != epoch {
            debug!("discarding stale extend batch after user switch");
            return 0;
        }
        let appended = batch.len();
        for (song, source) in batch {
            self.push_item(song, source, true);
        }
        if appended > 0 {
            debug!(appended, total = self.forward.len(), "queue extended");
        }
        appended
    }

    /// Resolve one more song and append it to the tail.
    pub async fn push_one<P: SongProvider>(
        &mut self,
        resolver: &mut SongResolver<P>,
        entries: &[WatchListEntry],
    ) -> Result<u64, Error> {
        let eligible = self.eligible(entries);
        if eligible.is_empty() {
            return Err(Error::QueueInitializationFailed);
        }
        let entry = self.pick_entry(&eligible).clone();
        let song = resolver.resolve(&entry, &self.config.allowed_types).await?;
        let source = SourceAnime::from(&entry);
        Ok(self.push_item(song, source, false))
    }

    /// Resolve up to `count` songs from randomly drawn entries,
    /// skipping per-item failures.
    async fn resolve_batch<P: SongProvider>(
        &mut self,
        resolver: &mut SongResolver<P>,
        entries: &[WatchListEntry],
        count: usize,
    ) -> Vec<(Song, SourceAnime)> {
        let eligible = self.eligible(entries);
        if eligible.is_empty() {
            warn!("no eligible entries to draw songs from");
            return Vec::new();
        }
        let attempts = count.min(eligible.len());

        let mut batch = Vec::with_capacity(attempts);
        for _ in 0..attempts {
            let entry = self.pick_entry(&eligible);
            match resolver.resolve(entry, &self.config.allowed_types).await {
                Ok(song) => {
                    let source = SourceAnime::from(entry);
                    batch.push((song, source));
                }
                Err(e) => warn!(media_id = entry.media.id, error = %e, "skipping entry"),
            }
        }
        batch
    }

    fn eligible<'a>(&self, entries: &'a [WatchListEntry]) -> Vec<&'a WatchListEntry> {
        entries
            .iter()
            .filter(|e| e.is_eligible())
            .filter(|e| match self.config.min_score {
                Some(min) => e.score.unwrap_or(0.0) >= min,
                None => true,
            })
            .collect()
    }

    fn pick_entry<'a>(&mut self, eligible: &[&'a WatchListEntry]) -> &'a WatchListEntry {
        match self.config.mode {
            SelectionMode::Uniform => eligible[self.rng.random_range(0..eligible.len())],
            SelectionMode::ScoreWeighted => {
                let weights: Vec<f64> = eligible
                    .iter()
                    .map(|e| e.score.filter(|s| *s > 0.0).unwrap_or(1.0))
                    .collect();
                let total: f64 = weights.iter().sum();
                let mut roll = self.rng.random_range(0.0..total);
                for (entry, weight) in eligible.iter().zip(&weights) {
                    if roll < *weight {
                        return entry;
                    }
                    roll -= weight;
                }
                eligible[eligible.len() - 1]
            }
        }
    }

    fn push_item(&mut self, song: Song, source: SourceAnime, preloaded: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.forward.push(QueueItem {
            id,
            song,
            source,
            preloaded,
            added_at: Utc::now(),
        });
        id
    }

    // ============ Navigation ============

    /// Advance to the next song. The departed song is copied into
    /// history; the forward queue itself is untouched. Raises a
    /// prefetch request when few songs remain ahead.
    pub fn next(&mut self) -> Option<&QueueItem> {
        let index = self.current_index?;
        if index + 1 >= self.forward.len() {
            return None;
        }
        self.history.push(self.forward[index].clone());
        let new_index = index + 1;
        self.current_index = Some(new_index);
        if self.forward.len() - new_index - 1 <= PREFETCH_THRESHOLD {
            self.prefetch_requested = true;
        }
        self.forward.get(new_index)
    }

    /// Step back. The most recent history item is reinserted at the
    /// current position, so the interrupted song stays just ahead and
    /// will play again. With empty history the pointer simply moves
    /// back when it can.
    pub fn previous(&mut self) -> Option<&QueueItem> {
        match self.history.pop() {
            Some(last) => {
                let index = self.current_index.unwrap_or(0);
                self.forward.insert(index, last);
                self.current_index = Some(index);
                self.forward.get(index)
            }
            None => {
                let index = self.current_index?;
                if index == 0 {
                    return None;
                }
                self.current_index = Some(index - 1);
                self.forward.get(index - 1)
            }
        }
    }

    pub fn can_go_next(&self) -> bool {
        self.current_index
            .is_some_and(|i| i + 1 < self.forward.len())
    }

    pub fn can_go_previous(&self) -> bool {
        !self.history.is_empty() || self.current_index.is_some_and(|i| i > 0)
    }

    /// Jump straight to a song anywhere in the queue or the history.
    /// Jumping ahead copies every skipped song into history; jumping
    /// into history reinserts the target right after the current song.
    pub fn jump_to(&mut self, item_id: u64) {
        let Some(index) = self.current_index else {
            return;
        };
        if self.forward.get(index).is_some_and(|c| c.id == item_id) {
            return;
        }

        if let Some(pos) = self.history.iter().position(|i| i.id == item_id) {
            let target = self.history.remove(pos);
            self.forward.insert(index + 1, target);
            self.history.push(self.forward[index].clone());
            self.current_index = Some(index + 1);
            return;
        }

        if let Some(target) = self.forward.iter().position(|i| i.id == item_id) {
            if target <= index {
                return;
            }
            for skipped in index..target {
                self.history.push(self.forward[skipped].clone());
            }
            self.current_index = Some(target);
            if self.forward.len() - target - 1 <= PREFETCH_THRESHOLD {
                self.prefetch_requested = true;
            }
        }
    }

    /// Shuffle the forward queue in place. The current song keeps its
    /// position; everything else is permuted around it.
    pub fn shuffle(&mut self) {
        if self.forward.len() < 2 {
            return;
        }
        let current = self.current_index;
        let mut others: Vec<QueueItem> = Vec::with_capacity(self.forward.len());
        let mut slots: Vec<usize> = Vec::with_capacity(self.forward.len());
        for (i, item) in self.forward.iter().enumerate() {
            if Some(i) != current {
                slots.push(i);
                others.push(item.clone());
            }
        }
        others.shuffle(&mut self.rng);
        for (slot, item) in slots.into_iter().zip(others) {
            self.forward[slot] = item;
        }
        debug!("queue shuffled");
    }

    // ============ Lifecycle ============

    /// Empty both containers and drop the pointer. Session flags
    /// (`initialized`, the last error) survive; use
    /// [`QueueEngine::reset_for_user`] on a user switch.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.history.clear();
        self.current_index = None;
        self.prefetch_requested = false;
    }

    /// Clear and refill for the same user.
    pub async fn restart<P: SongProvider>(
        &mut self,
        resolver: &mut SongResolver<P>,
        entries: &[WatchListEntry],
        batch_size: usize,
    ) -> Result<(), Error> {
        self.clear();
        self.initialized = false;
        self.error = None;
        self.initialize(resolver, entries, batch_size).await
    }

    /// Full reset on a user switch. Bumps the epoch so any in-flight
    /// batch from the previous user is discarded instead of committed.
    pub fn reset_for_user(&mut self) {
        self.clear();
        self.initialized = false;
        self.error = None;
        self.epoch += 1;
        self.init_state = OpState::Idle;
        self.preload_state = OpState::Idle;
    }

    // ============ Accessors ============

    pub fn current(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.forward.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn forward(&self) -> &[QueueItem] {
        &self.forward
    }

    pub fn history(&self) -> &[QueueItem] {
        &self.history
    }

    pub fn stats(&self) -> QueueStats {
        let total = self.forward.len();
        let position = self.current_index.map(|i| i + 1).unwrap_or(0);
        QueueStats {
            total,
            position,
            remaining: total.saturating_sub(position),
            history_len: self.history.len(),
            has_next: self.can_go_next(),
            has_previous: self.can_go_previous(),
        }
    }

    pub fn is_initializing(&self) -> bool {
        self.init_state == OpState::InFlight
    }

    pub fn is_preloading(&self) -> bool {
        self.preload_state == OpState::InFlight
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Take the pending prefetch request, if any. The caller serves it
    /// by running [`QueueEngine::extend`].
    pub fn take_prefetch_request(&mut self) -> bool {
        std::mem::take(&mut self.prefetch_requested)
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::{AnisongArtist, AnisongTrack, LinkedIds};
    use crate::models::{MediaInfo, MediaTitle, WatchStatus};
    use std::collections::BTreeSet;
    use std::collections::HashMap;

    fn entry(id: i64, title: &str, status: WatchStatus, score: Option<f64>) -> WatchListEntry {
        WatchListEntry {
            status,
            score,
            media: MediaInfo {
                id,
                title: MediaTitle {
                    english: Some(title.to_owned()),
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

    fn track(name: &str) -> AnisongTrack {
        AnisongTrack {
            ann_song_id: None,
            song_name: name.to_owned(),
            song_artist: "artist".into(),
            song_type: "Opening 1".into(),
            anime_en_name: None,
            anime_jp_name: None,
            anime_vintage: None,
            song_length: Some(90.0),
            audio: Some(format!("rips/{name}.mp3")),
            mq: None,
            hq: None,
            artists: vec![AnisongArtist::default()],
            composers: vec![],
            linked_ids: LinkedIds::default(),
        }
    }

    struct FakeSongs {
        by_title: HashMap<String, Vec<AnisongTrack>>,
    }

    impl crate::api::SongProvider for FakeSongs {
        async fn search_by_anime_title(
            &self,
            title: &str,
            _partial: bool,
        ) -> Result<Vec<AnisongTrack>, Error> {
            Ok(self.by_title.get(title).cloned().unwrap_or_default())
        }
    }

    /// Resolver where every listed title resolves to one opening.
    fn resolver_for(titles: &[&str]) -> SongResolver<FakeSongs> {
        let by_title = titles
            .iter()
            .map(|t| (t.to_string(), vec![track(&format!("song of {t}"))]))
            .collect();
        SongResolver::with_rng(FakeSongs { by_title }, StdRng::seed_from_u64(7))
    }

    fn engine() -> QueueEngine {
        QueueEngine::with_rng(StdRng::seed_from_u64(3))
    }

    /// Engine preloaded with `n` items, pointer at 0, no resolver involved.
    fn filled_engine(n: usize) -> QueueEngine {
        let mut q = engine();
        for i in 0..n {
            let e = entry(i as i64, &format!("t{i}"), WatchStatus::Watching, None);
            let song = Song {
                name: format!("s{i}"),
                artist: "a".into(),
                type_label: "Opening 1".into(),
                anime_en_title: None,
                anime_jp_title: None,
                season: None,
                season_year: None,
                audio_url: None,
                fallback_urls: vec![],
                duration_secs: None,
                artists: vec![],
                composers: vec![],
            };
            q.push_item(song, SourceAnime::from(&e), false);
        }
        q.current_index = Some(0);
        q.initialized = true;
        q
    }

    fn id_set(q: &QueueEngine) -> BTreeSet<u64> {
        q.forward
            .iter()
            .chain(q.history.iter())
            .map(|i| i.id)
            .collect()
    }

    #[tokio::test]
    async fn initialize_caps_attempts_at_eligible_count() {
        let entries = vec![
            entry(1, "t1", WatchStatus::Watching, None),
            entry(2, "t2", WatchStatus::Completed, None),
            entry(3, "t3", WatchStatus::Planning, None),
        ];
        let mut r = resolver_for(&["t1", "t2"]);
        let mut q = engine();
        q.initialize(&mut r, &entries, INITIAL_BATCH).await.unwrap();

        // 2 eligible entries cap the 5-song batch at 2 attempts
        assert_eq!(q.forward().len(), 2);
        assert_eq!(q.current_index(), Some(0));
        assert!(q.is_initialized());
        assert!(q.take_prefetch_request());
    }

    #[tokio::test]
    async fn initialize_skips_failing_entries() {
        let entries = vec![
            entry(1, "t1", WatchStatus::Watching, None),
            entry(2, "t2", WatchStatus::Watching, None),
            entry(3, "t3", WatchStatus::Watching, None),
            entry(4, "t4", WatchStatus::Watching, None),
            entry(5, "t5", WatchStatus::Watching, None),
            entry(6, "broken", WatchStatus::Watching, None),
        ];
        // "broken" yields no tracks at all
        let mut r = resolver_for(&["t1", "t2", "t3", "t4", "t5"]);
        let mut q = engine();
        q.initialize(&mut r, &entries, 6).await.unwrap();
        assert!(q.is_initialized());
        assert!(!q.forward().is_empty());
        assert!(q.forward().iter().all(|i| i.song.name.starts_with("song of t")));
    }

    #[tokio::test]
    async fn initialize_with_zero_songs_fails() {
        let entries = vec![entry(1, "broken", WatchStatus::Watching, None)];
        let mut r = resolver_for(&[]);
        let mut q = engine();
        let err = q.initialize(&mut r, &entries, 5).await.unwrap_err();
        assert!(matches!(err, Error::QueueInitializationFailed));
        assert!(!q.is_initialized());
        assert!(q.error_message().is_some());
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let entries = vec![entry(1, "t1", WatchStatus::Watching, None)];
        let mut r = resolver_for(&["t1"]);
        let mut q = engine();
        q.initialize(&mut r, &entries, 1).await.unwrap();
        let len = q.forward().len();
        q.initialize(&mut r, &entries, 1).await.unwrap();
        assert_eq!(q.forward().len(), len);
    }

    #[test]
    fn next_walks_forward_and_copies_into_history() {
        let mut q = filled_engine(5);
        q.next();
        q.next();
        q.next();
        assert_eq!(q.current_index(), Some(3));
        assert_eq!(q.history().len(), 3);
        assert_eq!(q.forward().len(), 5);
        assert_eq!(q.history()[0].id, q.forward()[0].id);
    }

    #[test]
    fn next_at_tail_is_a_no_op() {
        let mut q = filled_engine(2);
        q.next();
        assert!(q.next().is_none());
        assert_eq!(q.current_index(), Some(1));
    }

    #[test]
    fn previous_reinserts_the_last_history_item() {
        let mut q = filled_engine(5);
        q.next();
        q.next();
        q.next();
        let replayed = q.previous().map(|i| i.id);

        // the popped song sits at the pointer, the interrupted one just ahead
        assert_eq!(q.current_index(), Some(3));
        assert_eq!(q.history().len(), 2);
        assert_eq!(q.forward().len(), 6);
        assert_eq!(replayed, Some(q.forward()[3].id));
        assert_eq!(q.forward()[3].id, 2);
        assert_eq!(q.forward()[4].id, 3);
    }

    #[test]
    fn previous_with_empty_history_steps_the_pointer_back() {
        let mut q = filled_engine(3);
        q.current_index = Some(2);
        let item = q.previous().map(|i| i.id);
        assert_eq!(item, Some(1));
        assert_eq!(q.forward().len(), 3);
        assert!(q.previous().is_some());
        // at the head with no history there is nowhere to go
        assert!(q.previous().is_none());
    }

    #[test]
    fn navigation_preserves_the_song_set() {
        let mut q = filled_engine(5);
        let before = id_set(&q);
        q.next();
        q.next();
        q.previous();
        q.next();
        q.previous();
        q.previous();
        assert_eq!(id_set(&q), before);
    }

    #[test]
    fn jump_ahead_copies_skipped_songs_into_history() {
        let mut q = filled_engine(5);
        let target = q.forward()[3].id;
        q.jump_to(target);
        assert_eq!(q.current_index(), Some(3));
        assert_eq!(q.history().len(), 3);
        let skipped: Vec<u64> = q.history().iter().map(|i| i.id).collect();
        assert_eq!(skipped, vec![0, 1, 2]);
    }

    #[test]
    fn jump_into_history_reinserts_after_current() {
        let mut q = filled_engine(4);
        q.next();
        q.next();
        let target = q.history()[0].id;
        q.jump_to(target);

        assert_eq!(q.current().map(|i| i.id), Some(target));
        assert_eq!(q.current_index(), Some(3));
        assert!(q.history().iter().all(|i| i.id != target));
        // the interrupted song was pushed to history
        assert_eq!(q.history().last().map(|i| i.id), Some(2));
    }

    #[test]
    fn jump_to_current_is_a_no_op() {
        let mut q = filled_engine(3);
        let before_hist = q.history().len();
        let current = q.current().map(|i| i.id).unwrap();
        q.jump_to(current);
        assert_eq!(q.current_index(), Some(0));
        assert_eq!(q.history().len(), before_hist);
    }

    #[test]
    fn shuffle_keeps_the_current_song_in_place() {
        let mut q = filled_engine(8);
        q.next();
        q.next();
        let current = q.current().map(|i| i.id).unwrap();
        let before = id_set(&q);
        let original: Vec<u64> = q.forward().iter().map(|i| i.id).collect();

        let mut changed = false;
        for _ in 0..10 {
            q.shuffle();
            let now: Vec<u64> = q.forward().iter().map(|i| i.id).collect();
            if now != original {
                changed = true;
                break;
            }
        }
        assert!(changed);
        assert_eq!(q.current().map(|i| i.id), Some(current));
        assert_eq!(q.current_index(), Some(2));
        assert_eq!(id_set(&q), before);
    }

    #[test]
    fn prefetch_request_fires_near_the_tail() {
        let mut q = filled_engine(5);
        q.take_prefetch_request();
        q.next();
        // index 1, three songs ahead, still above the low-water mark
        assert!(!q.take_prefetch_request());
        q.next();
        // two songs ahead now
        assert!(q.take_prefetch_request());
        // the request is drained on take
        assert!(!q.take_prefetch_request());
    }

    #[tokio::test]
    async fn extend_appends_preloaded_items_and_never_fails() {
        let entries = vec![
            entry(1, "t1", WatchStatus::Watching, None),
            entry(2, "t2", WatchStatus::Watching, None),
            entry(3, "t3", WatchStatus::Watching, None),
            entry(4, "t4", WatchStatus::Watching, None),
            entry(5, "broken", WatchStatus::Watching, None),
        ];
        let mut r = resolver_for(&["t1", "t2", "t3", "t4"]);
        let mut q = filled_engine(2);
        let appended = q.extend(&mut r, &entries, PRELOAD_BATCH).await;
        assert!(appended >= 1);
        assert_eq!(q.forward().len(), 2 + appended);
        assert!(q.forward()[2..].iter().all(|i| i.preloaded));
        // current position untouched
        assert_eq!(q.current_index(), Some(0));
    }

    #[tokio::test]
    async fn push_one_appends_a_single_song() {
        let entries = vec![entry(1, "t1", WatchStatus::Watching, None)];
        let mut r = resolver_for(&["t1"]);
        let mut q = filled_engine(1);
        let id = q.push_one(&mut r, &entries).await.unwrap();
        assert_eq!(q.forward().len(), 2);
        assert_eq!(q.forward().last().map(|i| i.id), Some(id));
    }

    #[test]
    fn clear_keeps_session_flags() {
        let mut q = filled_engine(3);
        q.error = Some("old".into());
        q.clear();
        assert!(q.forward().is_empty());
        assert!(q.history().is_empty());
        assert_eq!(q.current_index(), None);
        assert!(q.is_initialized());
        assert!(q.error_message().is_some());
    }

    #[test]
    fn reset_for_user_drops_everything_and_bumps_the_epoch() {
        let mut q = filled_engine(3);
        q.error = Some("old".into());
        let epoch = q.epoch;
        q.reset_for_user();
        assert!(!q.is_initialized());
        assert!(q.error_message().is_none());
        assert_eq!(q.epoch, epoch + 1);
    }

    #[test]
    fn min_score_filters_the_pool() {
        let mut q = engine();
        q.set_config(SelectionConfig {
            min_score: Some(7.0),
            ..Default::default()
        });
        let entries = vec![
            entry(1, "low", WatchStatus::Watching, Some(4.0)),
            entry(2, "high", WatchStatus::Watching, Some(9.0)),
            entry(3, "unrated", WatchStatus::Watching, None),
        ];
        let pool = q.eligible(&entries);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].media.id, 2);
    }

    #[test]
    fn score_weighted_mode_still_draws_valid_entries() {
        let mut q = engine();
        q.set_config(SelectionConfig {
            mode: SelectionMode::ScoreWeighted,
            ..Default::default()
        });
        let entries = vec![
            entry(1, "a", WatchStatus::Watching, Some(2.0)),
            entry(2, "b", WatchStatus::Watching, Some(10.0)),
            entry(3, "c", WatchStatus::Watching, None),
        ];
        let pool = q.eligible(&entries);
        for _ in 0..50 {
            let picked = q.pick_entry(&pool);
            assert!(entries.iter().any(|e| e.media.id == picked.media.id));
        }
    }

    #[test]
    fn stats_reflect_queue_shape() {
        let mut q = filled_engine(5);
        q.next();
        let stats = q.stats();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.position, 2);
        assert_eq!(stats.remaining, 3);
        assert_eq!(stats.history_len, 1);
        assert!(stats.has_next);
        assert!(stats.has_previous);
    }
}
