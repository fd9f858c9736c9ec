//! Playlist download with CORS-proxy rotation and retry
//!
//! This sits outside the parser and catalog: it turns playlist sources into
//! raw text, and [`load_catalog`] feeds that text through the parser.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::PlaylistSource;
use crate::playlist::{parse, ParseWarning};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Something that can retrieve playlist text
pub trait PlaylistFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, FetchError>;
}

/// HTTP(S) fetcher routing requests through a rotating list of proxy prefixes
pub struct HttpFetcher {
    agent: ureq::Agent,
    proxies: Vec<String>,
    proxy_index: usize,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// An empty `proxies` list means direct requests
    pub fn new(proxies: Vec<String>, retry_attempts: u32, retry_delay: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(60)))
            .timeout_connect(Some(Duration::from_secs(30)))
            .build()
            .new_agent();

        Self {
            agent,
            proxies,
            proxy_index: 0,
            retry_attempts: retry_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.cors_proxies.clone(),
            config.fetch_retry_attempts,
            config.fetch_retry_delay(),
        )
    }

    /// URL actually requested for `url` through the current proxy
    pub fn request_url(&self, url: &str) -> String {
        match self.proxies.get(self.proxy_index) {
            Some(proxy) => format!("{}{}", proxy, urlencoding::encode(url)),
            None => url.to_string(),
        }
    }

    fn get(&self, url: &str) -> Result<String, FetchError> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", DEFAULT_USER_AGENT)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => FetchError::Status { url: url.to_string(), status },
                other => FetchError::Http { url: url.to_string(), message: other.to_string() },
            })?;

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| FetchError::Http { url: url.to_string(), message: format!("Read failed: {}", e) })
    }

    fn rotate_proxy(&mut self) {
        if !self.proxies.is_empty() {
            self.proxy_index = (self.proxy_index + 1) % self.proxies.len();
        }
    }
}

impl PlaylistFetcher for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        for attempt in 0..self.retry_attempts {
            let target = self.request_url(url);
            match self.get(&target) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!("Attempt {} failed for proxy {}: {}", attempt + 1, self.proxy_index, e);
                    self.rotate_proxy();
                    if attempt + 1 < self.retry_attempts {
                        thread::sleep(backoff_delay(self.retry_delay, attempt));
                    }
                }
            }
        }

        Err(FetchError::Exhausted { url: url.to_string(), attempts: self.retry_attempts })
    }
}

/// Wait before retry `attempt` (0-based): `base * 2^attempt`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Result of loading every configured playlist
#[derive(Debug)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub warnings: Vec<ParseWarning>,
    /// Sources that could not be fetched
    pub failed: Vec<PlaylistSource>,
}

/// Fetch and parse every source into one catalog.
///
/// Failing sources are skipped; only when none could be fetched does this
/// return [`FetchError::NoChannels`].
pub fn load_catalog<F: PlaylistFetcher>(
    fetcher: &mut F,
    sources: &[PlaylistSource],
    page_size: usize,
) -> Result<CatalogLoad, FetchError> {
    let mut outcomes = Vec::new();
    let mut warnings = Vec::new();
    let mut failed = Vec::new();

    for source in sources {
        match fetcher.fetch(&source.url) {
            Ok(text) => {
                let mut outcome = parse(&text, source.format);
                info!("Parsed {} channels from {}", outcome.channels.len(), source.url);
                warnings.append(&mut outcome.warnings);
                outcomes.push(outcome);
            }
            Err(e) => {
                warn!("Failed to fetch playlist {}: {}", source.url, e);
                failed.push(source.clone());
            }
        }
    }

    if outcomes.is_empty() {
        return Err(FetchError::NoChannels);
    }

    let mut catalog = Catalog::new(page_size);
    catalog.load_outcomes(outcomes);
    Ok(CatalogLoad { catalog, warnings, failed })
}
