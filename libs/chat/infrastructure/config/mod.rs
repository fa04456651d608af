use autosocket::ReconnectOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::websocket::endpoint::resolve_endpoint;

/// Overrides `endpoint` when set
pub const WEBSOCKET_ENDPOINT_ENV: &str = "WEBSOCKET_ENDPOINT";
/// Overrides `base_url` when set
pub const BASE_URL_ENV: &str = "BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Chat socket configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketConfig {
    /// URL the application is served from; relative endpoints resolve against it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// WebSocket endpoint, absolute or relative to `base_url`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Sub-protocols offered in `Sec-WebSocket-Protocol`
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/".to_string()
}

fn default_endpoint() -> String {
    "/api/v3/ws".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    3000
}

fn default_connection_timeout_ms() -> u64 {
    4000
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

impl ReconnectConfig {
    pub fn to_options(&self) -> ReconnectOptions {
        ReconnectOptions::new(
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            Duration::from_millis(self.connection_timeout_ms),
        )
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            protocols: Vec::new(),
            reconnect: ReconnectConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl SocketConfig {
    /// Load configuration from YAML file
    ///
    /// `WEBSOCKET_ENDPOINT` and `BASE_URL` from the environment take
    /// precedence over the file.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_yaml(&yaml_content)?;

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse YAML without environment overrides or validation
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(WEBSOCKET_ENDPOINT_ENV) {
            info!("Overriding WebSocket endpoint from environment variable");
            self.endpoint = endpoint;
        }
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            info!("Overriding base URL from environment variable");
            self.base_url = base_url;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "endpoint must not be empty".to_string(),
            ));
        }

        if self.reconnect.min_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect.min_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.connection_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect.connection_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.min_delay_ms > self.reconnect.max_delay_ms {
            return Err(ConfigError::ValidationError(format!(
                "reconnect.min_delay_ms ({}) must not exceed reconnect.max_delay_ms ({})",
                self.reconnect.min_delay_ms, self.reconnect.max_delay_ms
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        self.endpoint_url()?;
        Ok(())
    }

    /// Absolute socket URL derived from `endpoint` and `base_url`
    pub fn endpoint_url(&self) -> Result<Url> {
        resolve_endpoint(&self.endpoint, &self.base_url)
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Base URL: {}", self.base_url);
        info!("  Endpoint: {}", self.endpoint);
        if !self.protocols.is_empty() {
            info!("  Protocols: {}", self.protocols.join(", "));
        }
        info!(
            "  Reconnect: min {}ms, max {}ms, timeout {}ms",
            self.reconnect.min_delay_ms,
            self.reconnect.max_delay_ms,
            self.reconnect.connection_timeout_ms
        );
        info!("  Log level: {}", self.log_level);
    }
}
