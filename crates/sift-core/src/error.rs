//! Error types for sift.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sift operations.
pub type Result<T> = std::result::Result<T, SiftError>;

/// Errors that can occur in sift operations.
#[derive(Error, Debug)]
pub enum SiftError {
    /// I/O error on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration, reported before any document is processed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input set that cannot be processed as given.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SiftError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a configuration error.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
