//! Database error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a database driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid database name: {0}")]
    InvalidDatabase(String),
}

/// Errors surfaced by [`crate::SqlHandler`]
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Required parameter is empty: {0}")]
    MissingParameter(&'static str),

    #[error("No settings file at {path}")]
    SettingsMissing { path: PathBuf },

    #[error("Invalid settings file {path}: {message}")]
    InvalidSettings { path: PathBuf, message: String },

    #[error("Database error: {0}")]
    Driver(#[from] DriverError),

    /// The error was reported by the handler itself and the operation stopped
    #[error("Database operation halted: {0}")]
    Halted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for database operations
pub type DbResult<T> = Result<T, DbError>;
