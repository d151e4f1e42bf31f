//! Application configuration
//!
//! Loaded from a TOML file, by default
//! `~/.config/garage-service/config.toml`. A missing file is created with
//! defaults on first start.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::PollerConfig;
use crate::infrastructure::DatabaseConfig;
use crate::shared::utills::RetryConfig;

pub const CONFIG_ENV: &str = "GARAGE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub poller: PollerSettings,
    pub pricing: PricingSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 3003,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: StorageBackend,
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            url: DatabaseConfig::default().url,
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match self.backend {
            StorageBackend::Sqlite => self.url.clone(),
            StorageBackend::Memory => "memory".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerSettings {
    pub enabled: bool,
    /// Simulator base URL
    pub base_url: String,
    pub garage_path: String,
    pub interval_secs: u64,
    pub initial_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub fetch_attempts: u32,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:3000".to_string(),
            garage_path: "/garage".to_string(),
            interval_secs: 2,
            initial_delay_secs: 5,
            request_timeout_secs: 5,
            fetch_attempts: 3,
        }
    }
}

impl PollerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn to_poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.interval_secs.max(1)),
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            fetch_retry: RetryConfig::attempts(self.fetch_attempts),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    pub currency: String,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            currency: "BRL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error`, or any `EnvFilter` directive
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `path`, writing the defaults there first if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pricing.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("pricing.currency must not be empty".into()));
        }
        if self.poller.enabled && self.poller.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "poller.base_url is required when the poller is enabled".into(),
            ));
        }
        if !matches!(self.logging.format.to_lowercase().as_str(), "text" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be text or json, got {}",
                self.logging.format
            )));
        }
        Ok(())
    }

    pub fn database_config(&self) -> DatabaseConfig {
        match self.database.backend {
            StorageBackend::Sqlite => DatabaseConfig {
                url: self.database.url.clone(),
            },
            StorageBackend::Memory => DatabaseConfig::memory(),
        }
    }
}

/// `$GARAGE_CONFIG`, else `<config dir>/garage-service/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("garage-service")
        .join("config.toml")
}
