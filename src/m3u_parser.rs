//! M3U playlist parser
//!
//! Understands the extended M3U directives IPTV playlists use:
//! `#EXTINF` info lines, `#EXTVLCOPT:http-user-agent` and `#EXTHTTP`
//! header blobs. Damaged records are skipped with a warning; the parse
//! itself never fails.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{or_fallback, Channel, PLACEHOLDER_LOGO, UNCATEGORIZED, UNKNOWN_CHANNEL};
use crate::playlist::{ParseOutcome, ParseWarning};

const INFO_DIRECTIVE: &str = "#EXTINF:";
const USER_AGENT_DIRECTIVE: &str = "#EXTVLCOPT:http-user-agent";
const HTTP_DIRECTIVE: &str = "#EXTHTTP:";

/// Body of an `#EXTHTTP:` line
#[derive(Debug, Deserialize)]
struct HttpOptions {
    #[serde(default)]
    cookie: Option<String>,
    #[serde(default)]
    headers: Option<BTreeMap<String, String>>,
}

/// Channel being assembled from the directives seen since the last URL line
#[derive(Debug, Default)]
struct PendingChannel {
    name: Option<String>,
    logo: Option<String>,
    category: Option<String>,
    language: Option<String>,
    id: Option<String>,
    user_agent: Option<String>,
    cookie: Option<String>,
    headers: BTreeMap<String, String>,
}

impl PendingChannel {
    fn from_info(info: &str) -> Self {
        let (attr_part, name) = match info.rfind(',') {
            Some(pos) => (&info[..pos], info[pos + 1..].trim()),
            None => (info, ""),
        };
        let mut attrs = extract_attrs(attr_part);

        Self {
            name: Some(if name.is_empty() { UNKNOWN_CHANNEL.to_string() } else { name.to_string() }),
            logo: attrs.remove("tvg-logo"),
            category: attrs.remove("group-title"),
            language: attrs.remove("tvg-language"),
            id: attrs.remove("tvg-id"),
            ..Self::default()
        }
    }

    /// Complete the record with its URL. Returns `None` for link-only records.
    fn finish(self, link: &str) -> Option<Channel> {
        let name = self.name?;
        Some(Channel {
            name,
            link: link.to_string(),
            logo: or_fallback(self.logo, PLACEHOLDER_LOGO),
            category: or_fallback(self.category, UNCATEGORIZED),
            language: self.language,
            id: self.id,
            user_agent: self.user_agent,
            cookie: self.cookie,
            headers: self.headers,
        })
    }
}

/// Parse M3U content into channels, in playlist order
pub fn parse_m3u(content: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut pending = PendingChannel::default();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        let line_no = idx + 1;

        if line.is_empty() {
            continue;
        }

        if let Some(info) = line.strip_prefix(INFO_DIRECTIVE) {
            pending = PendingChannel::from_info(info);
        } else if line.starts_with(USER_AGENT_DIRECTIVE) {
            pending.user_agent = line
                .split_once('=')
                .map(|(_, ua)| ua.trim().to_string())
                .filter(|ua| !ua.is_empty());
        } else if let Some(blob) = line.strip_prefix(HTTP_DIRECTIVE) {
            match serde_json::from_str::<HttpOptions>(blob.trim()) {
                Ok(options) => {
                    pending.cookie = options.cookie;
                    pending.headers = options.headers.unwrap_or_default();
                }
                Err(e) => {
                    warn!(line = line_no, "Error parsing HTTP options: {}", e);
                    outcome.warnings.push(ParseWarning::InvalidHttpOptions { line: line_no });
                }
            }
        } else if line.starts_with('#') {
            // #EXTM3U header and directives we don't use
            continue;
        } else {
            match std::mem::take(&mut pending).finish(line) {
                Some(channel) => outcome.channels.push(channel),
                None => {
                    debug!(line = line_no, "Dropping link without a channel info line");
                    outcome.warnings.push(ParseWarning::OrphanLink { line: line_no });
                }
            }
        }
    }

    outcome
}

/// Extract `key="value"` pairs from the attribute part of an info line.
///
/// Keys are lowercased. Values may be quoted (with `\"` escapes) or bare.
/// Scanning stops at the first comma outside quotes.
fn extract_attrs(info: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut chars = info.chars().peekable();

    // Skip the duration ("-1", "0", "10.000")
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || c == '-' || c == '.' {
            chars.next();
        } else {
            break;
        }
    }

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None | Some(',') => break,
            _ => {}
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }

        if chars.peek() != Some(&'=') {
            // Bare token without a value
            continue;
        }
        chars.next();

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '"' {
                    break;
                }
                if c == '\\' && chars.peek() == Some(&'"') {
                    chars.next();
                    value.push('"');
                    continue;
                }
                value.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }

        // Tolerate stray quotes around keys, e.g. `"tvg-name="x"`
        let key = key.trim_matches('"').to_ascii_lowercase();
        if !key.is_empty() && !value.is_empty() {
            attrs.insert(key, value);
        }
    }

    attrs
}

#[cfg(test)]
#[path = "m3u_parser_tests.rs"]
mod tests;
