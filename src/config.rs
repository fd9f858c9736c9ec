//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::models::PlaylistSource;
use crate::player::PlayerSettings;

const DEFAULT_PLAYLISTS: &[&str] = &[
    "https://raw.githubusercontent.com/byte-capsule/Toffee-Channels-Link-Headers/refs/heads/main/toffee_OTT_Navigator.m3u",
    "https://raw.githubusercontent.com/byte-capsule/Toffee-Channels-Link-Headers/refs/heads/main/toffee_NS_Player.m3u",
];

const DEFAULT_CORS_PROXIES: &[&str] = &[
    "https://corsproxy.io/?url=",
    "https://api.allorigins.win/raw?url=",
    "https://api.codetabs.com/v1/proxy?quest=",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_playlists")]
    pub playlists: Vec<PlaylistSource>,
    #[serde(default = "default_cors_proxies")]
    pub cors_proxies: Vec<String>,
    #[serde(default = "default_retry_attempts")]
    pub fetch_retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub fetch_retry_delay_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub player_max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub player_retry_delay_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_playlists() -> Vec<PlaylistSource> {
    DEFAULT_PLAYLISTS.iter().map(|url| PlaylistSource::m3u(url)).collect()
}
fn default_cors_proxies() -> Vec<String> {
    DEFAULT_CORS_PROXIES.iter().map(|p| p.to_string()).collect()
}
fn default_retry_attempts() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_page_size() -> usize { 12 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dark_mode: false,
            playlists: default_playlists(),
            cors_proxies: default_cors_proxies(),
            fetch_retry_attempts: default_retry_attempts(),
            fetch_retry_delay_ms: default_retry_delay_ms(),
            player_max_retries: default_retry_attempts(),
            player_retry_delay_ms: default_retry_delay_ms(),
            page_size: default_page_size(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("iptv_browser");
        path.push("config.json");
        path
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. A missing or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Flip the display preference; returns the new value
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            max_retries: self.player_max_retries,
            retry_delay: Duration::from_millis(self.player_retry_delay_ms),
        }
    }

    pub fn fetch_retry_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistFormat;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json"));
        assert_eq!(config, AppConfig::default());
        assert!(!config.dark_mode);
        assert_eq!(config.playlists.len(), 2);
        assert_eq!(config.cors_proxies.len(), 3);
    }

    #[test]
    fn test_dark_mode_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        assert!(config.toggle_dark_mode());
        config.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path);
        assert!(reloaded.dark_mode);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"dark_mode": true, "playlists": [{"url": "http://x/list.json", "format": "json"}]}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path);
        assert!(config.dark_mode);
        assert_eq!(config.playlists[0].format, PlaylistFormat::Json);
        assert_eq!(config.page_size, 12);
        assert_eq!(config.player_settings(), PlayerSettings::default());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }
}
