//! Configuration loading and resolution
//!
//! Resolution priority, highest first:
//! 1. Command-line argument
//! 2. Environment variable (`PA_CONFIG`, `PA_BACKEND_URL`, `PA_API_KEY`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: the dashboard logs a warning and
//! starts on defaults. A config path given explicitly (CLI or `PA_CONFIG`)
//! must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the config file location
pub const ENV_CONFIG: &str = "PA_CONFIG";
/// Environment variable overriding `[gateway] base_url`
pub const ENV_BACKEND_URL: &str = "PA_BACKEND_URL";
/// Environment variable overriding `[gateway] api_key`
pub const ENV_API_KEY: &str = "PA_API_KEY";

const APP_DIR: &str = "photo-analyzer";

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote gateway connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL, without trailing `/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Shared secret sent as the `key` query parameter
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout. Analysis is synchronous and slow, keep this generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed delay before retrying a 503
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Total attempts for a transient failure (first call included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Live feed polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long to wait for a first snapshot before leaving the loading state
    #[serde(default = "default_first_snapshot_timeout_ms")]
    pub first_snapshot_timeout_ms: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Optimistic-overlay timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause between sequential analyses
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Age at which a removing-overlay entry is force-cleared (0 disables)
    #[serde(default = "default_stale_removing_secs")]
    pub stale_removing_secs: u64,

    /// Notice auto-dismiss delay
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

/// Local first-paint cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// SQLite file; defaults to the platform cache directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_gallery_ttl_secs")]
    pub gallery_ttl_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    2
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_first_snapshot_timeout_ms() -> u64 {
    8000
}

fn default_page_size() -> u32 {
    100
}

fn default_settle_delay_ms() -> u64 {
    600
}

fn default_stale_removing_secs() -> u64 {
    120
}

fn default_notice_ttl_ms() -> u64 {
    3500
}

fn default_gallery_ttl_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            first_snapshot_timeout_ms: default_first_snapshot_timeout_ms(),
            page_size: default_page_size(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            stale_removing_secs: default_stale_removing_secs(),
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            gallery_ttl_secs: default_gallery_ttl_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn first_snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.first_snapshot_timeout_ms)
    }
}

impl SyncConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// `None` when the stale sweep is disabled
    pub fn stale_removing_after(&self) -> Option<Duration> {
        (self.stale_removing_secs > 0).then(|| Duration::from_secs(self.stale_removing_secs))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

impl CacheConfig {
    /// Configured path, or `<cache dir>/photo-analyzer/cache.db`
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".").join(".photo-analyzer"))
                .join("cache.db")
        })
    }

    pub fn gallery_ttl(&self) -> Duration {
        Duration::from_secs(self.gallery_ttl_secs)
    }
}

impl DashConfig {
    /// Check values that would make the dashboard unusable
    pub fn validate(&self) -> Result<()> {
        let url = self.gateway.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "gateway.base_url must be an http(s) URL, got '{}'",
                self.gateway.base_url
            )));
        }
        if self.gateway.max_attempts == 0 {
            return Err(Error::Config(
                "gateway.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.feed.page_size == 0 {
            return Err(Error::Config("feed.page_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
}

/// Default configuration file path for the platform
///
/// `~/.config/photo-analyzer/config.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<DashConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write a config file, creating parent directories
pub fn write_toml_config(config: &DashConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Resolve the full configuration from CLI, environment, TOML and defaults
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<DashConfig> {
    // Explicit paths must exist; the platform default may be absent
    let explicit_path = overrides
        .config_path
        .clone()
        .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));

    let mut config = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::NotFound(format!(
                    "config file {}",
                    path.display()
                )));
            }
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => match default_config_path() {
            Some(path) if path.exists() => {
                let config = load_toml_config(&path)?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            Some(path) => {
                warn!(
                    "No config file at {}, using built-in defaults",
                    path.display()
                );
                DashConfig::default()
            }
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                DashConfig::default()
            }
        },
    };

    if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
        if !url.trim().is_empty() {
            config.gateway.base_url = url;
        }
    }
    if let Ok(key) = std::env::var(ENV_API_KEY) {
        if !key.trim().is_empty() {
            config.gateway.api_key = key;
        }
    }

    if let Some(url) = &overrides.backend_url {
        config.gateway.base_url = url.clone();
    }
    if let Some(key) = &overrides.api_key {
        config.gateway.api_key = key.clone();
    }

    config.gateway.base_url = config.gateway.base_url.trim_end_matches('/').to_string();

    if config.gateway.api_key.trim().is_empty() {
        warn!("Gateway API key not configured; requests will be rejected by the gateway");
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashConfig::default();
        assert_eq!(config.gateway.max_attempts, 2);
        assert_eq!(config.sync.settle_delay(), Duration::from_millis(600));
        assert_eq!(config.cache.gallery_ttl(), Duration::from_secs(300));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: DashConfig = toml::from_str(
            r#"
            [gateway]
            base_url = "https://gateway.example"
            api_key = "secret"

            [sync]
            stale_removing_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.base_url, "https://gateway.example");
        assert_eq!(config.gateway.retry_delay_ms, 2000);
        assert_eq!(config.feed.page_size, 100);
        assert_eq!(config.sync.stale_removing_after(), None);
        assert_eq!(config.sync.notice_ttl_ms, 3500);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = DashConfig::default();
        config.gateway.base_url = "gateway.example".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = DashConfig::default();
        config.gateway.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
