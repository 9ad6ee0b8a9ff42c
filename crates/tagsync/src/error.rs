//! Error types for tagsync

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// tagsync error type
#[derive(Error, Debug)]
pub enum TagSyncError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown component '{name}' (known: {known})")]
    UnknownComponent { name: String, known: String },

    #[error("Version file not found at {path} for component {component}")]
    MissingVersionFile { component: String, path: PathBuf },

    #[error("Invalid version tag in {path} for component {component}: {reason}")]
    InvalidVersionTag {
        component: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Pattern error for image '{image}': {source}")]
    Pattern {
        image: String,
        #[source]
        source: regex::Error,
    },
}

impl TagSyncError {
    /// True for errors that stem from the component configuration rather
    /// than from the filesystem being scanned.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TagSyncError::ConfigParse { .. }
                | TagSyncError::Config(_)
                | TagSyncError::UnknownComponent { .. }
                | TagSyncError::MissingVersionFile { .. }
                | TagSyncError::InvalidVersionTag { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TagSyncError>;
