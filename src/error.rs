//! Error types
//!
//! Parse problems are not errors: the parser reports them as
//! [`ParseWarning`](crate::playlist::ParseWarning) values and keeps going.

use thiserror::Error;

/// Errors from the playlist fetch collaborator
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed for {url}: {message}")]
    Http { url: String, message: String },

    #[error("HTTP error {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Giving up on {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },

    #[error("No channels available")]
    NoChannels,
}

/// Errors reading or writing the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure classes reported to the user, one per failure instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerErrorKind {
    Capability,
    Network,
    Media,
    Fatal,
}

/// User-visible playback failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("Sorry, this client does not support the required video format.")]
    Unsupported,

    #[error("Network error: the stream could not be reached after {attempts} retries.")]
    Network { attempts: u32 },

    #[error("Playback error: media recovery failed after {attempts} attempts.")]
    Media { attempts: u32 },

    #[error("An error occurred while playing the video: {details}")]
    Fatal { details: String },

    #[error("Failed to play the video: {reason}")]
    PlaybackRejected { reason: String },

    #[error("Quality level {index} is not available ({available} levels)")]
    InvalidQualityLevel { index: usize, available: usize },
}

impl PlayerError {
    pub fn kind(&self) -> PlayerErrorKind {
        match self {
            PlayerError::Unsupported => PlayerErrorKind::Capability,
            PlayerError::Network { .. } => PlayerErrorKind::Network,
            PlayerError::Media { .. } => PlayerErrorKind::Media,
            PlayerError::Fatal { .. }
            | PlayerError::PlaybackRejected { .. }
            | PlayerError::InvalidQualityLevel { .. } => PlayerErrorKind::Fatal,
        }
    }
}
