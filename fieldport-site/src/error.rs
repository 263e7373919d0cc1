//! Error types for on-disk sites

use std::path::PathBuf;
use thiserror::Error;

/// Result type for site operations
pub type Result<T> = std::result::Result<T, SiteError>;

#[derive(Debug, Error)]
pub enum SiteError {
    /// A snapshot file parsed but describes an inconsistent site
    #[error("invalid site snapshot {path}: {message}")]
    InvalidSnapshot { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
