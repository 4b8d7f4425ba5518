//! Client configuration.
//!
//! Defaults target a locally running generation backend. Environment
//! variables override defaults; CLI flags override both.

use std::time::Duration;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the streaming generation endpoint.
pub const STREAM_ENDPOINT: &str = "/api/generate/stream";

/// Default username sent with job requests.
pub const DEFAULT_USERNAME: &str = "chandan";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "JOBFEED_URL";

/// Environment variable overriding the username.
pub const ENV_USERNAME: &str = "JOBFEED_USERNAME";

/// Environment variable setting the idle timeout, in seconds.
pub const ENV_IDLE_TIMEOUT: &str = "JOBFEED_IDLE_TIMEOUT_SECS";

/// Configuration for submitting a job and consuming its feed.
///
/// # Example
///
/// ```
/// use jobfeed::config::FeedConfig;
/// use std::time::Duration;
///
/// let config = FeedConfig::default()
///     .with_base_url("http://gen.internal:9000/")
///     .with_idle_timeout(Some(Duration::from_secs(120)));
/// assert_eq!(config.stream_url(), "http://gen.internal:9000/api/generate/stream");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Backend base URL, without the endpoint path
    pub base_url: String,
    /// Username placed in job requests
    pub username: String,
    /// TCP connect timeout for the initial request
    pub connect_timeout: Duration,
    /// Maximum silence between chunks before the feed is considered lost.
    /// `None` waits indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: None,
        }
    }
}

impl FeedConfig {
    /// Create a new FeedConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `JOBFEED_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable source.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(username) = lookup(ENV_USERNAME).filter(|v| !v.trim().is_empty()) {
            self.username = username;
        }
        if let Some(raw) = lookup(ENV_IDLE_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.idle_timeout = None,
                Ok(secs) => self.idle_timeout = Some(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(
                    "Ignoring {}={:?}: not a whole number of seconds",
                    ENV_IDLE_TIMEOUT,
                    raw
                ),
            }
        }
        self
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the username sent with job requests.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle timeout between chunks.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Full URL of the streaming endpoint.
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), STREAM_ENDPOINT)
    }
}
