//! HTTP surface of the WASM tool gateway
//!
//! Wires the tool catalog, the plugin registry and the executor behind two
//! MCP-style endpoints:
//!
//! - `GET /tools/list` returns the catalog
//! - `POST /tools/call` runs one tool and wraps its output in the call
//!   envelope
//!
//! Both endpoints can be put behind a bearer token. `GET /health` is always
//! open.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wasm_gateway_protocol::ToolCatalog;
//! use wasm_gateway_runtime::{Executor, LoadPolicy, PluginRegistry, WasmConfig, WasmSandbox};
//! use wasm_gateway_server::{AppState, BearerAuth, Listener, router, serve, shutdown_signal};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let catalog = ToolCatalog::from_file("tools/mcp.list.json")?;
//! let sandbox = WasmSandbox::new(WasmConfig::new("functions"))?;
//! let registry = PluginRegistry::new(Arc::new(sandbox), LoadPolicy::Cached);
//! let executor = Executor::new("handle", Duration::from_secs(30));
//!
//! let app = router(AppState::new(catalog, registry, executor), BearerAuth::disabled());
//! serve(app, "0.0.0.0:8080".parse()?, Listener::Plain, shutdown_signal()).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod server;


pub use auth::BearerAuth;
pub use config::GatewayConfig;
pub use error::{AuthError, CallError, ConfigError};
pub use http::{AppState, router};
pub use logging::{LogFormat, init_logging};
pub use server::{Listener, serve, serve_plain, shutdown_signal};
