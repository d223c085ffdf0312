//! Client configuration
//!
//! Settings are loaded from (in order of priority):
//! 1. `SANDWORM_API_URL` environment variable (base URL only)
//! 2. JSON file (~/.config/sandworm/client.json)
//! 3. Built-in defaults

use log::debug;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};

/// Client settings filename in the sandworm config directory
const CLIENT_CONFIG_FILE: &str = "client.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "SANDWORM_API_URL";

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.claude.ai/api";

/// Browser user agent; the API rejects obvious non-browser clients
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:129.0) Gecko/20100101 Firefox/129.0";

/// Settings for the HTTP transport
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root every request path is appended to
    pub base_url: String,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    /// Timeout for one attempt, independent of the retry budget
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load settings from the config directory and environment
    pub fn load() -> Result<Self> {
        let mut config = if config::config_exists(CLIENT_CONFIG_FILE) {
            debug!("Loading client settings from {}", CLIENT_CONFIG_FILE);
            config::load_json::<ClientConfig>(CLIENT_CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.is_empty()
        {
            config.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse settings from a JSON string; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json).map_err(|source| Error::Parse {
            what: "client configuration",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the base URL is an absolute http(s) URL and timeouts are usable
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidConfig(format!("base_url {:?}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(Error::InvalidConfig("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each further retry
    pub base_delay_ms: u64,
    /// Upper bound of the random extra delay, as a fraction of the backoff
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Retry immediately, for tests
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            jitter: 0.0,
        }
    }

    /// Attempts to make; never less than one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff before retry number `retry` (1 for the second attempt)
    ///
    /// `base * 2^(retry-1)`, without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << exponent))
    }

    /// Backoff plus a random extra of up to `jitter * backoff`
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let backoff = self.backoff(retry);
        let fraction = self.jitter.clamp(0.0, 1.0) * rand_fraction();
        backoff + backoff.mul_f64(fraction)
    }
}

/// Random value in [0, 1) with two decimal places
fn rand_fraction() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let hasher = RandomState::new().build_hasher();
    (hasher.finish() % 100) as f64 / 100.0
}
