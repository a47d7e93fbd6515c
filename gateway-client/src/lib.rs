//! Host-side client for the WASM tool gateway
//!
//! Discovers the gateway's tools, turns them into function-calling
//! definitions for a language model, and relays the model's calls back.
//!
//! ```no_run
//! use serde_json::json;
//! use wasm_gateway_client::GatewayClient;
//!
//! # async fn run() -> wasm_gateway_client::Result<()> {
//! let client = GatewayClient::new("http://localhost:8080")?.with_token("secret");
//!
//! let functions = client.function_tools().await?;
//! println!("{} functions available", functions.len());
//!
//! let response = client
//!     .call_tool("add_numbers", json!({"number1": 28, "number2": 12}))
//!     .await?;
//! println!("{}", response.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::GatewayClient;
pub use error::{ClientError, Result};
