//! Data models for the IPTV channel browser

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Category sentinel that selects every channel
pub const ALL_CATEGORIES: &str = "All";
/// Category assigned to channels without a group
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Display name for channels whose info line carries no name
pub const UNKNOWN_CHANNEL: &str = "Unknown Channel";
/// Logo used when a channel has none
pub const PLACEHOLDER_LOGO: &str = "images/placeholder.png";
/// A playlist group literally named like [`ALL_CATEGORIES`] is renamed to this
pub const RENAMED_ALL_GROUP: &str = "All (playlist group)";

/// Playlist encoding hint passed to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistFormat {
    #[default]
    M3u,
    Json,
}

/// Where a playlist lives and how to decode it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSource {
    pub url: String,
    #[serde(default)]
    pub format: PlaylistFormat,
}

impl PlaylistSource {
    pub fn m3u(url: &str) -> Self {
        Self {
            url: url.to_string(),
            format: PlaylistFormat::M3u,
        }
    }
}

/// A playable channel.
///
/// `name` and `link` are always non-empty once a channel leaves the parser,
/// `logo` and `category` fall back to their placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub name: String,
    pub link: String,
    #[serde(default = "default_logo", deserialize_with = "logo_or_placeholder")]
    pub logo: String,
    #[serde(default = "default_category", deserialize_with = "category_or_uncategorized")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

fn default_logo() -> String { PLACEHOLDER_LOGO.to_string() }
fn default_category() -> String { UNCATEGORIZED.to_string() }

/// `value` unless it is missing or blank
pub(crate) fn or_fallback(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

fn logo_or_placeholder<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(|v| or_fallback(v, PLACEHOLDER_LOGO))
}

fn category_or_uncategorized<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(|v| or_fallback(v, UNCATEGORIZED))
}

impl Channel {
    /// Build a channel with every optional field at its default
    pub fn new(name: &str, link: &str) -> Self {
        Self {
            name: name.to_string(),
            link: link.to_string(),
            logo: default_logo(),
            category: default_category(),
            language: None,
            id: None,
            user_agent: None,
            cookie: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// True when the channel can be shown and played
    pub fn is_playable(&self) -> bool {
        !self.name.trim().is_empty() && !self.link.trim().is_empty()
    }

    /// Request headers the streaming engine should send for this channel.
    ///
    /// Custom headers come first so the dedicated `userAgent`/`cookie`
    /// fields win on conflict.
    pub fn request_headers(&self) -> BTreeMap<String, String> {
        let mut headers = self.headers.clone();
        if let Some(ref ua) = self.user_agent {
            headers.retain(|k, _| !k.eq_ignore_ascii_case("user-agent"));
            headers.insert("User-Agent".to_string(), ua.clone());
        }
        if let Some(ref cookie) = self.cookie {
            headers.retain(|k, _| !k.eq_ignore_ascii_case("cookie"));
            headers.insert("Cookie".to_string(), cookie.clone());
        }
        headers
    }
}
