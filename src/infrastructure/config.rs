//! Configuration file management.
//!
//! Reads `config.toml`, writing a commented default on first run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# redtime configuration
# Auto-generated - edit as needed

[session]
# Quiet period before typed search text is sent, in milliseconds
debounce_ms = 500

# Refresh cadence of the running timer, in milliseconds
tick_ms = 1000

[http]
# Request timeout in seconds
timeout_secs = 30

[paths]
# Custom data directory (optional, defaults to ~/.redtime)
# data_dir = "/custom/path"
"#;

/// Read `~/.redtime/config.toml`, falling back to defaults when absent.
///
/// # Errors
/// Returns error if the file exists but is unreadable, malformed or invalid.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path();
    if path.exists() {
        load_config_from_file(&path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Parse and validate a config file.
///
/// # Errors
/// Returns error if the file cannot be read, is not valid TOML, or carries
/// out-of-range session timings.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("{}: {e}", path.display()),
    })?;
    config.session.validate()?;
    Ok(config)
}

/// Write the commented default config unless one is already there.
///
/// # Errors
/// Returns error if the directory or file cannot be created.
pub fn ensure_config_exists() -> Result<()> {
    write_default_config(&config_file_path())
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| AppError::io("Failed to create data directory", e))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;

    tracing::info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[must_use]
pub fn config_file_path() -> PathBuf {
    AppConfig::default_data_dir().join("config.toml")
}
