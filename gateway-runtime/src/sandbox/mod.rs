//! Sandbox backend abstraction

#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod wasm;

pub use wasm::{WasmConfig, WasmSandbox};

use crate::error::Result;
use crate::name::ToolName;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A constructed plugin bound to exactly one tool
///
/// Units are shared behind an `Arc`; every call gets its own isolated
/// instance state, so concurrent calls on one unit do not interfere.
pub trait ExecutionUnit: Send + Sync + fmt::Debug {
    /// Tool this unit was built for
    fn tool(&self) -> &ToolName;

    /// Run `entry_point` once with `input` and return what it produced
    ///
    /// Blocks the calling thread until the entry point returns, faults, or
    /// `deadline` expires.
    fn call(&self, entry_point: &str, input: &[u8], deadline: Duration) -> Result<Vec<u8>>;
}

/// Sandbox backend trait
///
/// Turns a tool name into an [`ExecutionUnit`]. Construction may be slow
/// (compilation), so callers run it off the async workers.
pub trait Sandbox: Send + Sync + fmt::Debug {
    /// Construct a unit for `name`
    fn load(&self, name: &ToolName) -> Result<Arc<dyn ExecutionUnit>>;
}

/// Maps tool names to artifact paths: `<root>/<name>/<file_name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
    file_name: String,
}

impl ArtifactLayout {
    /// Default artifact file name inside each tool directory
    pub const DEFAULT_FILE_NAME: &'static str = "plugin.wasm";

    /// Layout rooted at `root` with the default file name
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file_name: Self::DEFAULT_FILE_NAME.to_string(),
        }
    }

    /// Override the artifact file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact path for a tool
    pub fn path_for(&self, name: &ToolName) -> PathBuf {
        self.root.join(name.as_str()).join(&self.file_name)
    }
}
