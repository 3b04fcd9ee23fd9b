use rand::Rng;

/// User-Agent sent when nothing else is configured
pub const DEFAULT_USER_AGENT: &str = concat!("trawler/", env!("CARGO_PKG_VERSION"));

/// Browser identities used when rotation is enabled without an explicit pool
pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Where the User-Agent header of each request comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAgentSource {
    /// Same value on every request
    Fixed(String),
    /// Uniformly random pick from a non-empty pool per request
    Rotating(Vec<String>),
}

impl UserAgentSource {
    /// Builds a rotating source, falling back to [`BROWSER_USER_AGENTS`]
    pub fn rotating(pool: Vec<String>) -> Self {
        if pool.is_empty() {
            Self::Rotating(BROWSER_USER_AGENTS.iter().map(|s| s.to_string()).collect())
        } else {
            Self::Rotating(pool)
        }
    }

    /// Returns the User-Agent for the next request
    pub fn next_agent(&self) -> &str {
        match self {
            Self::Fixed(agent) => agent,
            Self::Rotating(pool) if pool.is_empty() => DEFAULT_USER_AGENT,
            Self::Rotating(pool) => {
                let index = rand::rng().random_range(0..pool.len());
                &pool[index]
            }
        }
    }
}

impl Default for UserAgentSource {
    fn default() -> Self {
        Self::Fixed(DEFAULT_USER_AGENT.to_string())
    }
}
