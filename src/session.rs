//! Playback session state
//!
//! Sits between the queue and whatever actually plays audio. The
//! transport is a trait so the session logic runs identically against
//! a real audio element and the recording fake in the tests.
//!
//! Fallback handling: a song carries an ordered candidate list
//! (primary rip, then lower-quality mirrors). Each transport error
//! advances a cursor through that list; when the candidates run out
//! the song is abandoned and playback stops until the user or the
//! queue moves on.

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::QueueItem;

/// The transport refused to start playback, e.g. a browser autoplay
/// policy rejection.
#[derive(Debug, Error)]
#[error("playback rejected by the transport: {0}")]
pub struct TransportError(pub String);

/// Minimal surface of an audio backend.
pub trait AudioTransport {
    fn load(&mut self, url: &str);
    fn play(&mut self) -> Result<(), TransportError>;
    fn pause(&mut self);
    /// Seek to an absolute position in seconds.
    fn seek(&mut self, position_secs: f64);
    /// Volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f64);
}

/// Notifications the transport feeds back into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Metadata arrived; the track is ready to play.
    Loaded { duration_secs: f64 },
    TimeUpdate { elapsed_secs: f64 },
    Ended,
    /// The current source failed to load or decode.
    Error { message: String },
}

/// What the session asks of its owner after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    /// The track finished; advance the queue and load the next item.
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    RepeatOne,
}

/// Pure fallback cursor: the candidate to try after `tried` URLs
/// already failed.
pub fn next_candidate(urls: &[String], tried: usize) -> Option<&str> {
    urls.get(tried).map(String::as_str)
}

/// UI-facing snapshot of the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackInfo {
    pub is_playing: bool,
    pub volume: u8,
    pub muted: bool,
    pub repeat: RepeatMode,
    pub elapsed_secs: f64,
    pub duration_secs: f64,
}

pub struct PlaybackSession<T> {
    transport: T,
    is_playing: bool,
    /// 0..=100, the UI scale
    volume: u8,
    muted: bool,
    repeat: RepeatMode,
    elapsed_secs: f64,
    duration_secs: f64,
    /// False until the user has started playback once; the first load
    /// after a user switch must not autoplay.
    started: bool,
    candidates: Vec<String>,
    tried: usize,
    current_item_id: Option<u64>,
}

impl<T: AudioTransport> PlaybackSession<T> {
    pub fn new(transport: T) -> Self {
        PlaybackSession {
            transport,
            is_playing: false,
            volume: 70,
            muted: false,
            repeat: RepeatMode::Off,
            elapsed_secs: 0.0,
            duration_secs: 0.0,
            started: false,
            candidates: Vec::new(),
            tried: 0,
            current_item_id: None,
        }
    }

    /// Point the transport at a queue item. Playback starts once the
    /// transport reports the load, and only if the session has already
    /// been started by the user.
    pub fn load_item(&mut self, item: &QueueItem) {
        self.candidates = item.song.candidate_urls();
        self.tried = 0;
        self.elapsed_secs = 0.0;
        self.duration_secs = item.song.duration_secs.unwrap_or(0.0);
        self.is_playing = false;
        self.current_item_id = Some(item.id);

        match next_candidate(&self.candidates, 0) {
            Some(url) => {
                debug!(item = item.id, url, "loading track");
                self.transport.load(url);
            }
            None => warn!(item = item.id, "track has no playable url"),
        }
    }

    /// Feed a transport notification through the session state
    /// machine. Returns a request for the owner when the queue should
    /// move.
    pub fn handle_event(&mut self, event: TransportEvent) -> Option<SessionRequest> {
        match event {
            TransportEvent::Loaded { duration_secs } => {
                self.duration_secs = duration_secs;
                if self.started {
                    self.try_play();
                }
                None
            }
            TransportEvent::TimeUpdate { elapsed_secs } => {
                self.elapsed_secs = elapsed_secs;
                None
            }
            TransportEvent::Ended => {
                if self.repeat == RepeatMode::RepeatOne {
                    self.transport.seek(0.0);
                    self.elapsed_secs = 0.0;
                    self.try_play();
                    None
                } else {
                    self.is_playing = false;
                    Some(SessionRequest::Advance)
                }
            }
            TransportEvent::Error { message } => {
                self.tried += 1;
                match next_candidate(&self.candidates, self.tried) {
                    Some(url) => {
                        debug!(url, error = %message, "source failed, trying fallback");
                        self.transport.load(url);
                    }
                    None => {
                        warn!(error = %message, "all sources failed, abandoning track");
                        self.is_playing = false;
                    }
                }
                None
            }
        }
    }

    fn try_play(&mut self) {
        match self.transport.play() {
            Ok(()) => self.is_playing = true,
            Err(e) => {
                debug!(error = %e, "transport refused to play");
                self.is_playing = false;
            }
        }
    }

    /// Explicit user play. Marks the session started, which unlocks
    /// autoplay for subsequent loads.
    pub fn play(&mut self) {
        self.started = true;
        self.try_play();
    }

    pub fn pause(&mut self) {
        self.transport.pause();
        self.is_playing = false;
    }

    pub fn toggle_play(&mut self) {
        if self.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Space-bar handler. Ignored while an editable element has focus
    /// so typing a username does not toggle playback.
    pub fn handle_toggle_key(&mut self, editable_focused: bool) {
        if editable_focused {
            return;
        }
        self.toggle_play();
    }

    /// Volume on the 0..=100 UI scale. Setting 0 mutes.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        self.muted = self.volume == 0;
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        let effective = if self.muted {
            0.0
        } else {
            f64::from(self.volume) / 100.0
        };
        self.transport.set_volume(effective);
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    /// Seek by progress-bar fraction, 0..=100.
    pub fn seek_fraction(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        let position = percent / 100.0 * self.duration_secs;
        self.transport.seek(position);
        self.elapsed_secs = position;
    }

    /// Drop per-user playback state. Volume, mute and repeat settings
    /// survive; the autoplay guard re-arms.
    pub fn reset_for_user(&mut self) {
        self.transport.pause();
        self.is_playing = false;
        self.started = false;
        self.elapsed_secs = 0.0;
        self.duration_secs = 0.0;
        self.candidates.clear();
        self.tried = 0;
        self.current_item_id = None;
    }

    pub fn snapshot(&self) -> PlaybackInfo {
        PlaybackInfo {
            is_playing: self.is_playing,
            volume: self.volume,
            muted: self.muted,
            repeat: self.repeat,
            elapsed_secs: self.elapsed_secs,
            duration_secs: self.duration_secs,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_item_id(&self) -> Option<u64> {
        self.current_item_id
    }
}
