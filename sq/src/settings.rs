//! Database credentials
//!
//! Credentials never live in the main configuration; they are read from a
//! separate YAML settings file holding `user` and `password`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Default settings file name, looked up next to the main config
pub const SETTINGS_FILE: &str = "settings.yml";

#[derive(Clone, Serialize, Deserialize)]
pub struct SqlSettings {
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for SqlSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlSettings")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SqlSettings {
    /// Read credentials from `path`
    pub fn load(path: &Path) -> DbResult<Self> {
        if !path.exists() {
            return Err(DbError::SettingsMissing {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content).map_err(|e| DbError::InvalidSettings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if settings.user.is_empty() {
            return Err(DbError::InvalidSettings {
                path: path.to_path_buf(),
                message: "user is empty".to_string(),
            });
        }
        debug!(path = %path.display(), user = %settings.user, "loaded sql settings");
        Ok(settings)
    }

    /// Default location: `~/.config/aurora/settings.yml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aurora")
            .join(SETTINGS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "user: web\npassword: s3cret\n").unwrap();

        let settings = SqlSettings::load(&path).unwrap();
        assert_eq!(settings.user, "web");
        assert_eq!(settings.password, "s3cret");
    }

    #[test]
    fn test_missing_settings_file() {
        let temp = TempDir::new().unwrap();
        let err = SqlSettings::load(&temp.path().join(SETTINGS_FILE)).unwrap_err();
        assert!(matches!(err, DbError::SettingsMissing { .. }));
    }

    #[test]
    fn test_empty_user_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "user: ''\n").unwrap();

        let err = SqlSettings::load(&path).unwrap_err();
        assert!(matches!(err, DbError::InvalidSettings { .. }));
    }

    #[test]
    fn test_debug_hides_password() {
        let settings = SqlSettings {
            user: "web".to_string(),
            password: "s3cret".to_string(),
        };
        let shown = format!("{:?}", settings);
        assert!(shown.contains("web"));
        assert!(!shown.contains("s3cret"));
    }
}
