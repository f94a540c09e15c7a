//! Process-wide directory configuration, read once at startup and immutable
//! afterwards. Reload is owned by the host; the connector only consumes it.

use std::time::Duration;

use anyhow::{Context, Result};

/// Source tag stamped on every principal, role and user produced by this
/// connector. Mirrors the realm/source name the host sees.
pub const SOURCE: &str = "crowd";

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL of the remote directory, e.g. `https://crowd.example.com/crowd`.
    /// `None` means the directory is not configured and every operation
    /// short-circuits to `NotConfigured`.
    pub base_url: Option<String>,
    /// Application credentials this connector presents to the directory.
    pub application_name: String,
    pub application_password: String,
    /// How long a locally cached, verified credential stays trusted.
    pub cache_ttl: Duration,
    /// Timeout applied to every remote call; timeouts surface as `Unavailable`.
    pub request_timeout: Duration,
    /// Upper bound on user search results.
    pub max_search_results: usize,
    /// When the remote directory is unreachable, accept a matching cached
    /// credential even past its TTL. Off by default (fail-closed).
    pub fail_open: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            application_name: String::new(),
            application_password: String::new(),
            cache_ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(5),
            max_search_results: 100,
            fail_open: false,
        }
    }
}

impl DirectoryConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Read configuration from `CROWD_*` environment variables. Missing
    /// variables fall back to defaults; a missing `CROWD_URL` yields an
    /// unconfigured directory rather than an error.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("CROWD_URL").ok().filter(|u| !u.is_empty());
        let application_name = std::env::var("CROWD_APP_NAME").unwrap_or_default();
        let application_password = std::env::var("CROWD_APP_PASSWORD").unwrap_or_default();
        let cache_ttl_secs = env_u64("CROWD_CACHE_TTL_SECS", 3600)?;
        let timeout_secs = env_u64("CROWD_TIMEOUT_SECS", 5)?;
        let max_search_results = env_u64("CROWD_MAX_RESULTS", 100)? as usize;
        let fail_open = std::env::var("CROWD_FAIL_OPEN")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self {
            base_url,
            application_name,
            application_password,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            max_search_results,
            fail_open,
        })
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(v) => v.parse::<u64>().with_context(|| format!("{key} must be an integer, got '{v}'")),
        Err(_) => Ok(default),
    }
}
