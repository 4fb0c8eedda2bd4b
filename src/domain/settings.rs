//! Application configuration.
//!
//! Tuning for the session pipelines and the HTTP client, plus the location
//! of the data directory holding the config and credential files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// Timing configuration for the live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Quiet period before typed search text is submitted.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Refresh cadence of the running timer display.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Both timings must be positive.
    ///
    /// # Errors
    /// Returns a config error naming the offending key.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [("debounce_ms", self.debounce_ms), ("tick_ms", self.tick_ms)] {
            if value == 0 {
                return Err(AppError::Config {
                    message: format!("session.{key} must be greater than zero"),
                });
            }
        }
        Ok(())
    }
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_tick_ms() -> u64 {
    1000
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".redtime")
    }

    /// Get the credentials file path.
    #[must_use]
    pub fn credentials_file_path(&self) -> PathBuf {
        self.data_dir().join("credentials.toml")
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
