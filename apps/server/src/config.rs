//! Application configuration.

use carry_alerts::{Locale, TelegramConfig, TelegramError};
use carry_engine::WatchDefaults;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("Telegram setup failed: {0}")]
    Telegram(String),
}

impl From<TelegramError> for ConfigError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::MissingEnv(key) => ConfigError::MissingEnv(key),
            other => ConfigError::Telegram(other.to_string()),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Liveness endpoint port.
    pub port: u16,
    /// Initial sampler period in seconds.
    pub poll_interval_secs: u64,
    /// Initial entry threshold (expected daily return, %).
    pub open_threshold: f64,
    /// Initial exit threshold (expected daily return, %).
    pub close_threshold: f64,
    /// Command keyword language.
    pub locale: Locale,
    /// Timeout for market data and outbound chat requests.
    pub request_timeout_secs: u64,
    /// Pause between command polls, also the retry backoff.
    pub command_poll_secs: u64,
    /// Provider-side long-poll wait for inbound commands.
    pub long_poll_secs: u32,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let watch = WatchDefaults::default();
        Self {
            port: 8080,
            poll_interval_secs: watch.poll_interval_secs,
            open_threshold: watch.open_threshold,
            close_threshold: watch.close_threshold,
            locale: Locale::default(),
            request_timeout_secs: 10,
            command_poll_secs: 3,
            long_poll_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn watch_defaults(&self) -> WatchDefaults {
        WatchDefaults {
            poll_interval_secs: self.poll_interval_secs,
            open_threshold: self.open_threshold,
            close_threshold: self.close_threshold,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn command_poll(&self) -> Duration {
        Duration::from_secs(self.command_poll_secs)
    }

    /// Telegram credentials from the environment plus the polling settings.
    pub fn telegram(&self) -> Result<TelegramConfig, ConfigError> {
        Ok(TelegramConfig::from_env()?
            .with_long_poll_secs(self.long_poll_secs)
            .with_request_timeout(self.request_timeout()))
    }
}
