//! Error types for plugin loading and execution

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Runtime error type
///
/// Distinguishes a plugin that cannot be found from one that cannot be
/// built and from one that fails while running.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested name cannot address a plugin
    #[error("Invalid tool name '{name}': {reason}")]
    InvalidToolName {
        /// Rejected name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// No artifact exists for the tool
    #[error("No plugin found for tool '{name}' at {}", path.display())]
    ArtifactNotFound {
        /// Tool name
        name: String,
        /// Where the artifact was expected
        path: PathBuf,
    },

    /// The artifact exists but could not be turned into a runnable unit
    #[error("Failed to load plugin for tool '{name}': {message}")]
    ConstructionFailed {
        /// Tool name
        name: String,
        /// Failure detail
        message: String,
    },

    /// The unit was built but its entry point failed
    #[error("Plugin for tool '{name}' failed: {message}")]
    InvocationFailed {
        /// Tool name
        name: String,
        /// Failure detail
        message: String,
    },

    /// The entry point did not return before the deadline
    #[error("Plugin for tool '{name}' did not finish within {timeout:?}")]
    Timeout {
        /// Tool name
        name: String,
        /// Deadline that expired
        timeout: Duration,
    },

    /// Engine setup error
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),

    /// I/O error outside of a plugin call
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a construction error
    pub fn construction(name: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Create an invocation error
    pub fn invocation(name: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::InvocationFailed {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(name: impl std::fmt::Display, timeout: Duration) -> Self {
        Self::Timeout {
            name: name.to_string(),
            timeout,
        }
    }

    /// True when the tool simply does not exist (bad name or no artifact)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InvalidToolName { .. } | Self::ArtifactNotFound { .. }
        )
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, Error>;
