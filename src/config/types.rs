use crate::fetcher::{BackoffPolicy, UserAgentSource};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Trawler
///
/// Every section and key is optional; missing values fall back to the
/// defaults documented on each field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub requests: RequestConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

/// Request pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RequestConfig {
    /// Minimum time between consecutive requests (milliseconds, default 1000)
    pub delay_ms: u64,

    /// Retries after the first attempt for transient failures (default 3)
    pub max_retries: u32,

    /// Per-request timeout (milliseconds, default 30000)
    pub timeout_ms: u64,

    /// Maximum in-flight fetches for the async scraper (default 10)
    pub max_concurrent: u32,

    /// First back-off delay; doubles on every retry (milliseconds, default 1000)
    pub backoff_base_ms: u64,

    /// Upper bound for a single back-off delay (milliseconds, default 30000)
    pub backoff_max_ms: u64,

    /// Add a random extra wait of up to half the delay between requests
    pub jitter: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            max_retries: 3,
            timeout_ms: 30_000,
            max_concurrent: 10,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
            jitter: false,
        }
    }
}

/// HTTP identity and transport configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Fixed User-Agent header; ignored when `rotate-user-agent` is set
    pub user_agent: Option<String>,

    /// Pick a User-Agent per request from `user-agents`
    pub rotate_user_agent: bool,

    /// Rotation pool; a built-in browser list is used when empty
    pub user_agents: Vec<String>,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// Proxy URL applied to all schemes
    pub proxy: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Format tag used when the caller does not name one (default "json")
    pub default_format: String,

    /// Copy an existing destination file aside before replacing it
    pub backup: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_format: "json".to_string(),
            backup: true,
        }
    }
}

impl ScraperConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.requests.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.requests.timeout_ms)
    }

    pub fn max_retries(&self) -> u32 {
        self.requests.max_retries
    }

    pub fn max_concurrent(&self) -> usize {
        self.requests.max_concurrent as usize
    }

    /// Back-off schedule derived from the request settings
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.requests.backoff_base_ms),
            Duration::from_millis(self.requests.backoff_max_ms),
        )
    }

    /// Where request User-Agent values come from
    pub fn user_agent_source(&self) -> UserAgentSource {
        if self.http.rotate_user_agent {
            UserAgentSource::rotating(self.http.user_agents.clone())
        } else {
            match &self.http.user_agent {
                Some(agent) => UserAgentSource::Fixed(agent.clone()),
                None => UserAgentSource::default(),
            }
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.requests.delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.requests.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.requests.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: u32) -> Self {
        self.requests.max_concurrent = max_concurrent;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.requests.backoff_base_ms = base.as_millis() as u64;
        self.requests.backoff_max_ms = max.as_millis() as u64;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http.user_agent = Some(user_agent.into());
        self.http.rotate_user_agent = false;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.storage.backup = backup;
        self
    }
}
