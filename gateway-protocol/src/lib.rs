//! Core types for the WASM tool gateway
//!
//! This crate holds everything the gateway and its hosts agree on at the wire
//! level:
//!
//! - **Catalog**: the static list of tools, loaded once and served verbatim
//! - **Envelopes**: the `{"result": {...}}` shapes for listing and calling tools
//! - **Translation**: conversion of the catalog into the function-calling
//!   schema understood by LLM clients
//!
//! # Quick Start
//!
//! ```rust
//! use wasm_gateway_protocol::{ToolCatalog, translate};
//!
//! let raw = br#"{"result":{"tools":[{
//!     "name": "say_hello",
//!     "description": "Say hello to someone",
//!     "inputSchema": {
//!         "type": "object",
//!         "properties": {"name": {"type": "string", "description": "who to greet"}},
//!         "required": ["name"]
//!     }
//! }]}}"#;
//!
//! let catalog = ToolCatalog::from_slice(raw.to_vec()).unwrap();
//! assert!(catalog.contains("say_hello"));
//!
//! let functions = translate(raw).unwrap();
//! assert!(String::from_utf8(functions).unwrap().contains("\"function\""));
//! ```

pub mod catalog;
pub mod error;
pub mod model;
pub mod translate;

#[cfg(test)]
mod model_tests;

pub use catalog::ToolCatalog;
pub use error::{ProtocolError, Result};
pub use model::*;
pub use translate::{FunctionSpec, FunctionTool, translate, translate_tools};

/// Content type used for every JSON body the gateway produces
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
