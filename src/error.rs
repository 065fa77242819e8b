//! Error types for staging messages

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while staging a message
#[derive(Error, Debug)]
pub enum StageError {
    /// Filesystem operation failed for the given path
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to split a raw message into headers and body
    #[error("Failed to parse message structure: {0}")]
    Structure(String),

    /// Failed to read or parse the configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl StageError {
    /// Wrap an `io::Error` together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for staging operations
pub type Result<T> = std::result::Result<T, StageError>;
