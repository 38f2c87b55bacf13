//! Configuration management for Feedgate.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `FEEDGATE__*` environment variables. The binary applies CLI flags last.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FeedgateError, Result};
use crate::ratelimit::Limits;

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "FEEDGATE";

/// Main configuration for the Feedgate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Update source configuration
    #[serde(default)]
    pub updates: UpdatesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Requests a single client may make per window
    #[serde(default = "default_per_client_limit")]
    pub per_client_limit: u64,

    /// Requests admitted across all clients per window
    #[serde(default = "default_global_limit")]
    pub global_limit: u64,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            per_client_limit: default_per_client_limit(),
            global_limit: default_global_limit(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_per_client_limit() -> u64 {
    10
}

fn default_global_limit() -> u64 {
    100
}

fn default_window_secs() -> u64 {
    60
}

impl RateLimitingConfig {
    /// Build the limiter limits described by this section.
    pub fn limits(&self) -> Limits {
        Limits {
            per_client: self.per_client_limit,
            global: self.global_limit,
            window: Duration::from_secs(self.window_secs),
        }
    }
}

/// Update source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatesConfig {
    /// Path to the JSON file holding the update list
    #[serde(default = "default_updates_path")]
    pub path: PathBuf,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            path: default_updates_path(),
        }
    }
}

fn default_updates_path() -> PathBuf {
    PathBuf::from("updates.json")
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FeedgateConfig {
    /// Load configuration from a YAML file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: FeedgateConfig = serde_yaml::from_str(yaml)
            .map_err(|e| FeedgateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load layered configuration: defaults, the optional file, then
    /// environment variables such as `FEEDGATE__RATE_LIMITING__GLOBAL_LIMIT`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(FeedgateError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(::config::File::from(path));
        }

        let loaded: FeedgateConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| FeedgateError::Config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Check values that deserialize fine but cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.window_secs == 0 {
            return Err(FeedgateError::Config(
                "rate_limiting.window_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults() {
        let config = FeedgateConfig::default();

        assert_eq!(config.server.http_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.rate_limiting.per_client_limit, 10);
        assert_eq!(config.rate_limiting.global_limit, 100);
        assert_eq!(config.rate_limiting.window_secs, 60);
        assert_eq!(config.updates.path, PathBuf::from("updates.json"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_ok!(config.validate());
    }

    #[test]
    fn test_limits_from_config() {
        let limits = RateLimitingConfig {
            per_client_limit: 2,
            global_limit: 3,
            window_secs: 5,
        }
        .limits();

        assert_eq!(limits.per_client, 2);
        assert_eq!(limits.global, 3);
        assert_eq!(limits.window, Duration::from_secs(5));
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
server:
  http_addr: 127.0.0.1:9000
rate_limiting:
  global_limit: 500
logging:
  format: json
"#;
        let config = FeedgateConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.rate_limiting.global_limit, 500);
        // Unset fields fall back to defaults
        assert_eq!(config.rate_limiting.per_client_limit, 10);
        assert_eq!(config.rate_limiting.window_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_zero_window_rejected() {
        let yaml = r#"
rate_limiting:
  window_secs: 0
"#;
        let err = FeedgateConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, FeedgateError::Config(_)));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert_err!(FeedgateConfig::from_yaml("rate_limiting: [1, 2"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "rate_limiting:\n  per_client_limit: 3\n  window_secs: 15\nupdates:\n  path: /srv/updates.json"
        )
        .unwrap();

        let config = FeedgateConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.rate_limiting.per_client_limit, 3);
        assert_eq!(config.rate_limiting.window_secs, 15);
        assert_eq!(config.rate_limiting.global_limit, 100);
        assert_eq!(config.updates.path, PathBuf::from("/srv/updates.json"));
    }

    #[test]
    fn test_sample_config_file() {
        let config = FeedgateConfig::from_file("feedgate.yaml").unwrap();

        assert_eq!(config.rate_limiting.limits(), Limits::default());
        assert_eq!(config.updates.path, PathBuf::from("updates.json"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FeedgateConfig::load(Some(Path::new("/nonexistent/feedgate.yaml"))).unwrap_err();
        assert!(matches!(err, FeedgateError::Config(_)));
    }
}
