//! Capability interface between the player controller and the outside world
//!
//! The streaming engine (an HLS library) and the media sink (the video
//! surface) are collaborators the controller only drives and observes.
//! Whoever implements these traits feeds the resulting events back through
//! [`PlayerController::handle`](super::PlayerController::handle), tagged with
//! the session they belong to.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::PlayerError;

/// Identity of one playback session. Never reused.
pub type SessionId = u64;

/// Request configuration applied to every request the engine issues
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub headers: BTreeMap<String, String>,
}

/// One adaptive-bitrate variant reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLevel {
    pub index: usize,
    pub height: Option<u32>,
    pub bitrate: Option<u64>,
}

impl QualityLevel {
    pub fn label(&self) -> String {
        match (self.height, self.bitrate) {
            (Some(h), _) => format!("{}p", h),
            (None, Some(b)) => format!("{} kbps", b / 1000),
            (None, None) => format!("Level {}", self.index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualitySelection {
    #[default]
    Auto,
    Level(usize),
}

/// Error type reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorType {
    Network,
    Media,
    Other,
}

/// Error code reported by the media sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorCode {
    Aborted,
    Network,
    Decode,
    SourceNotSupported,
}

/// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Engine bound itself to the sink
    MediaAttached,
    /// Engine parsed the manifest; `levels` may be empty
    ManifestParsed { levels: Vec<QualityLevel> },
    LevelSwitched { level: usize },
    EngineError { kind: EngineErrorType, fatal: bool, details: String },
    /// Sink loaded metadata for a natively played source
    LoadedMetadata,
    /// Sink is buffering
    Waiting,
    CanPlay,
    Playing,
    SinkError { code: SinkErrorCode, message: String },
    /// A scheduled network retry is due
    RetryElapsed { attempt: u32 },
}

/// Messages for the UI layer, drained with
/// [`PlayerController::drain_notices`](super::PlayerController::drain_notices)
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerNotice {
    NowPlaying(String),
    Loading(bool),
    QualityLevels(Vec<QualityLevel>),
    QualityChanged(QualitySelection),
    /// Recoverable failure; a retry is under way
    Retrying { attempt: u32, max_attempts: u32, delay: Option<Duration> },
    /// Playback resumed after a recoverable failure
    ErrorCleared,
    /// Terminal failure, shown once
    Error(PlayerError),
    Closed,
}

/// An HLS engine instance bound to one session
pub trait StreamingEngine {
    fn load_source(&mut self, url: &str);
    fn attach_media(&mut self);
    /// Restart loading after a network failure
    fn start_load(&mut self);
    fn recover_media_error(&mut self);
    /// `None` restores automatic level selection
    fn set_current_level(&mut self, level: Option<usize>);
    fn destroy(&mut self);
}

/// Factory for engine instances
pub trait StreamingBackend {
    type Engine: StreamingEngine;

    fn is_supported(&self) -> bool;

    /// Build an engine for `session`. Events it raises must be delivered
    /// with the same session id.
    fn create(&mut self, session: SessionId, config: EngineConfig) -> Self::Engine;
}

/// The surface playback renders into
pub trait MediaSink {
    /// Whether the sink plays HLS without an engine
    fn can_play_native_hls(&self) -> bool;
    fn set_source(&mut self, url: &str);
    fn clear_source(&mut self);
    fn play(&mut self) -> Result<(), String>;
    fn pause(&mut self);
}
