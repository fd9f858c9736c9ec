//! Playlist decoding entry point
//!
//! [`parse`] selects the decoding path from the format hint. Neither path
//! fails: damaged records are skipped and reported as [`ParseWarning`]s.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::m3u_parser::parse_m3u;
use crate::models::{Channel, PlaylistFormat};

/// Non-fatal problem found while parsing a playlist
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    #[error("line {line}: invalid #EXTHTTP options, cookie and headers ignored")]
    InvalidHttpOptions { line: usize },

    #[error("line {line}: stream URL without a preceding #EXTINF line was dropped")]
    OrphanLink { line: usize },

    #[error("playlist is not a JSON array of channels: {message}")]
    InvalidJson { message: String },

    #[error("record {index}: not a channel object: {message}")]
    InvalidJsonRecord { index: usize, message: String },

    #[error("record {index}: missing name or link")]
    MissingFields { index: usize },
}

/// Channels decoded from one playlist, plus whatever was skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub channels: Vec<Channel>,
    pub warnings: Vec<ParseWarning>,
}

/// Decode raw playlist text using the given format hint
pub fn parse(text: &str, format: PlaylistFormat) -> ParseOutcome {
    match format {
        PlaylistFormat::M3u => parse_m3u(text),
        PlaylistFormat::Json => parse_json(text),
    }
}

/// Decode a JSON array of already-shaped channel objects
pub fn parse_json(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let records: Vec<Value> = match serde_json::from_str(text) {
        Ok(records) => records,
        Err(e) => {
            warn!("Error parsing JSON playlist: {}", e);
            outcome.warnings.push(ParseWarning::InvalidJson { message: e.to_string() });
            return outcome;
        }
    };

    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Channel>(record) {
            Ok(channel) if channel.is_playable() => outcome.channels.push(channel),
            Ok(_) => {
                warn!(index, "Skipping JSON channel without name or link");
                outcome.warnings.push(ParseWarning::MissingFields { index });
            }
            Err(e) => {
                warn!(index, "Skipping invalid JSON channel: {}", e);
                outcome
                    .warnings
                    .push(ParseWarning::InvalidJsonRecord { index, message: e.to_string() });
            }
        }
    }

    outcome
}
