#![deny(unsafe_code)]

//! Configuration loading and validation for Waypost.
//!
//! Loads TOML configuration files and validates them against expected
//! schemas. Provides the [`AppConfig`] type as the central
//! configuration structure. The well-known discovery socket path lives
//! here — it is always explicit configuration, never a compiled-in
//! literal, so independent deployments (and tests) can run their own
//! discovery endpoints side by side.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// IPC rendezvous configuration.
    #[serde(default)]
    pub ipc: IpcConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// IPC rendezvous configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcConfig {
    /// Well-known discovery socket path that ephemeral endpoint names
    /// are advertised to.
    #[serde(default = "default_discovery_path")]
    pub discovery_path: String,

    /// Directory for freshly generated ephemeral sockets. Falls back
    /// to the OS temp directory when unset.
    #[serde(default)]
    pub socket_dir: Option<String>,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            discovery_path: default_discovery_path(),
            socket_dir: None,
        }
    }
}

fn default_discovery_path() -> String {
    "/tmp/waypost.sock".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ipc.discovery_path.is_empty() {
            return Err(ConfigError::Validation(
                "ipc.discovery_path must not be empty".to_string(),
            ));
        }
        if let Some(dir) = &self.ipc.socket_dir {
            if dir.is_empty() {
                return Err(ConfigError::Validation(
                    "ipc.socket_dir must not be empty when set".to_string(),
                ));
            }
        }
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }
        Ok(())
    }
}
