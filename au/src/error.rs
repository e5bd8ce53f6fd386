//! Aurora error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or rendering a page
#[derive(Debug, Error)]
pub enum AuroraError {
    #[error("Required parameter is empty: {0}")]
    MissingParameter(&'static str),

    #[error("Template not found: {path}")]
    TemplateNotFound { path: PathBuf },

    #[error("Invalid directory: {path}")]
    InvalidDirectory { path: PathBuf },

    #[error("Template file and/or variables not set")]
    NothingToRender,

    #[error("Asset does not exist: {path}")]
    AssetMissing { path: PathBuf },

    #[error("Integrity file does not exist: {path}")]
    SidecarMissing { path: PathBuf },

    #[error("Integrity mismatch for {path}: expected {expected}, found {actual}")]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Preload '{fragment}' does not match any stylesheet or script url")]
    UnresolvedPreload { fragment: String },

    #[error("No version header found in {path}")]
    VersionNotFound { path: PathBuf },

    #[error("Invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to read resource usage: {0}")]
    ResourceUsage(#[from] nix::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuroraError {
    /// Whether this error means an asset would have been served unverified
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            AuroraError::AssetMissing { .. }
                | AuroraError::SidecarMissing { .. }
                | AuroraError::IntegrityMismatch { .. }
                | AuroraError::UnresolvedPreload { .. }
        )
    }
}

/// Result alias for aurora operations
pub type AuroraResult<T> = Result<T, AuroraError>;
