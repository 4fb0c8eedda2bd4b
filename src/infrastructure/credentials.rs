//! Stored Redmine credentials.
//!
//! A missing file means "not configured" and is not an error.

use std::fs;
use std::path::Path;

use crate::domain::{AppError, Credentials, Result};

/// Load credentials, returning `None` when none are stored.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_credentials(path: &Path) -> Result<Option<Credentials>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read credentials: {}", path.display()), e))?;

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| AppError::Config {
            message: format!("Stored credentials are invalid: {e}"),
        })
}

/// Save credentials, creating the data directory if needed.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn save_credentials(path: &Path, credentials: &Credentials) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create data directory", e))?;
    }

    let content = toml::to_string_pretty(credentials).map_err(|e| AppError::Config {
        message: format!("Failed to serialize credentials: {e}"),
    })?;

    fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write credentials: {}", path.display()), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| AppError::io("Failed to restrict credentials file", e))?;
    }

    tracing::info!(path = %path.display(), url = %credentials.url, "Credentials saved");

    Ok(())
}

/// Remove stored credentials. Missing credentials are not an error.
///
/// # Errors
/// Returns error if the file exists but cannot be removed.
pub fn clear_credentials(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Credentials removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::io("Failed to remove credentials", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn credentials() -> Credentials {
        Credentials {
            url: "https://redmine.example.com".into(),
            username: "alice".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_missing_file_is_not_configured() {
        let dir = tempdir().unwrap();
        let loaded = load_credentials(&dir.path().join("credentials.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.toml");

        save_credentials(&path, &credentials()).unwrap();
        assert_eq!(load_credentials(&path).unwrap(), Some(credentials()));

        clear_credentials(&path).unwrap();
        assert!(load_credentials(&path).unwrap().is_none());
        clear_credentials(&path).unwrap();
    }

    #[test]
    fn test_garbage_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        fs::write(&path, "url = 3").unwrap();

        assert!(matches!(
            load_credentials(&path),
            Err(AppError::Config { .. })
        ));
    }
}
