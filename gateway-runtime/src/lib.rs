//! Sandboxed plugin execution for the WASM tool gateway
//!
//! This crate turns a tool name into a running WASM plugin and back into
//! bytes:
//!
//! - **Names**: [`ToolName`] is the only way to address a plugin; it rejects
//!   anything that could escape the functions directory
//! - **Sandbox**: pluggable [`Sandbox`] backends construct [`ExecutionUnit`]s
//!   ([`WasmSandbox`] runs WASI modules with wasmtime)
//! - **Registry**: [`PluginRegistry`] caches units per name, or builds a
//!   fresh one per call, depending on the [`LoadPolicy`]
//! - **Executor**: [`Executor`] runs a unit's entry point off the async
//!   workers, under a deadline
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wasm_gateway_runtime::{Executor, LoadPolicy, PluginRegistry, ToolName, WasmConfig, WasmSandbox};
//!
//! # async fn run() -> wasm_gateway_runtime::Result<()> {
//! let sandbox = WasmSandbox::new(WasmConfig::new("functions"))?;
//! let registry = PluginRegistry::new(Arc::new(sandbox), LoadPolicy::Cached);
//! let executor = Executor::new("handle", Duration::from_secs(30));
//!
//! let name = ToolName::parse("say_hello")?;
//! let unit = registry.get_or_load(&name).await?;
//! let output = executor.invoke(&unit, br#"{"name":"Bob"}"#.to_vec()).await?;
//! # let _ = output;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod error;
mod executor;
mod name;
mod registry;
pub mod sandbox;

pub use error::{Error, Result};
pub use executor::Executor;
pub use name::ToolName;
pub use registry::{LoadPolicy, PluginRegistry, UnitLease};
pub use sandbox::{ArtifactLayout, ExecutionUnit, Sandbox, WasmConfig, WasmSandbox};

#[cfg(any(test, feature = "test-util"))]
pub use sandbox::mock::{MockHandler, MockSandbox};
