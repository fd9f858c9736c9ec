//! IPTV channel browser
//!
//! Parses M3U (and JSON) playlists into channels, keeps them in a
//! searchable catalog, and drives an external HLS engine for playback.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod m3u_parser;
pub mod models;
pub mod player;
pub mod playlist;

pub use catalog::{Catalog, Page};
pub use config::AppConfig;
pub use error::{ConfigError, FetchError, PlayerError, PlayerErrorKind};
pub use models::{Channel, PlaylistFormat, PlaylistSource};
pub use playlist::{parse, ParseOutcome, ParseWarning};
