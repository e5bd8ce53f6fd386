//! sqlhandler configuration
//!
//! Shares the aurora config files; only the `sql` section and `log-level`
//! are read here, everything else in the file is ignored.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::driver::ConnectOptions;
use crate::error::{DbError, DbResult};
use crate::handler::SqlHandler;
use crate::settings::SqlSettings;
use crate::sqlite_driver::SqliteDriver;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level override (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    pub sql: SqlConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".aurora.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("aurora").join("aurora.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("WARN")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mysql,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    pub database: String,

    pub backend: Backend,

    /// Directory holding `{database}.sqlite3` files
    #[serde(rename = "sqlite-dir")]
    pub sqlite_dir: PathBuf,

    /// Credentials file; defaults to `~/.config/aurora/settings.yml`
    #[serde(rename = "settings-file")]
    pub settings_file: Option<PathBuf>,

    #[serde(flatten)]
    pub options: ConnectOptions,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            backend: Backend::default(),
            sqlite_dir: PathBuf::from("."),
            settings_file: None,
            options: ConnectOptions::default(),
        }
    }
}

impl SqlConfig {
    pub fn settings_path(&self) -> PathBuf {
        self.settings_file.clone().unwrap_or_else(SqlSettings::default_path)
    }

    /// Open a handler on the configured backend
    pub fn open(&self) -> DbResult<SqlHandler> {
        match self.backend {
            Backend::Mysql => SqlHandler::connect(&self.database, &self.options, &self.settings_path()),
            Backend::Sqlite => {
                if self.database.is_empty() {
                    return Err(DbError::MissingParameter("database"));
                }
                let driver = SqliteDriver::open(&self.sqlite_dir, &self.database).map_err(DbError::from)?;
                Ok(SqlHandler::with_driver(Box::new(driver), &self.database, self.options.error_mode))
            }
        }
    }
}
