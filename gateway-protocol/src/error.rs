//! Error types for catalog loading and schema translation

use std::path::PathBuf;
use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The input was not valid JSON, or did not have the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The catalog file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Two catalog entries share a name
    #[error("Tool '{0}' is declared more than once")]
    DuplicateTool(String),

    /// A catalog entry has an empty name
    #[error("Catalog entry {0} has an empty name")]
    EmptyToolName(usize),
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
