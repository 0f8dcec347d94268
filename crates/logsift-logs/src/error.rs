//! Error types for log scanning.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while scanning a log source.
#[derive(Debug, Error)]
pub enum LogError {
    /// The log source could not be opened.
    #[error("log source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an open source failed part way through.
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    /// A matched record could not be re-encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
