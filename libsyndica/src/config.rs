//! Configuration management for Syndica

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Rate-limit policy. `fail_open` decides what happens when the shared
/// counter store is unreachable: admit and log (true) or surface the error
/// (false).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSection {
    #[serde(default = "default_true")]
    pub fail_open: bool,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Per-platform overrides keyed by platform name, e.g. `[rate_limit.platforms.twitter]`.
    #[serde(default)]
    pub platforms: HashMap<String, PlatformQuota>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformQuota {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            fail_open: true,
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            platforms: HashMap::new(),
        }
    }
}

impl RateLimitSection {
    /// Effective quota for one platform: the override when present, else the
    /// global default.
    pub fn quota_for(&self, platform: &str) -> (u32, Duration) {
        match self.platforms.get(platform) {
            Some(q) => (q.max_requests, Duration::from_secs(q.window_secs)),
            None => (self.max_requests, Duration::from_secs(self.window_secs)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Override the remote API base URL, mainly for test servers.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_max_requests() -> u32 {
    60
}
fn default_window_secs() -> u64 {
    3600
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/syndica/posts.db".to_string(),
            },
            rate_limit: RateLimitSection::default(),
            retry: RetrySection::default(),
            http: HttpSection::default(),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SYNDICA_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("syndica").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default_config();
        assert!(config.rate_limit.fail_open);
        assert_eq!(config.rate_limit.max_requests, 60);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [database]
            path = "/tmp/syndica.db"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.path, "/tmp/syndica.db");
        // Omitted sections come back with defaults
        assert!(config.rate_limit.fail_open);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_platform_quota_override() {
        let toml = r#"
            [database]
            path = ":memory:"

            [rate_limit]
            max_requests = 100
            window_secs = 3600
            fail_open = false

            [rate_limit.platforms.twitter]
            max_requests = 25
            window_secs = 900
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.rate_limit.fail_open);

        let (max, window) = config.rate_limit.quota_for("twitter");
        assert_eq!(max, 25);
        assert_eq!(window, Duration::from_secs(900));

        let (max, window) = config.rate_limit.quota_for("instagram");
        assert_eq!(max, 100);
        assert_eq!(window, Duration::from_secs(3600));
    }
}
