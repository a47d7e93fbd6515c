//! `wasm-gateway` binary

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use wasm_gateway_protocol::ToolCatalog;
use wasm_gateway_runtime::{Executor, PluginRegistry, WasmConfig, WasmSandbox};
use wasm_gateway_server::{AppState, BearerAuth, GatewayConfig, init_logging, router, serve, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::parse();
    init_logging(config.log_format, &config.log_level)?;
    config.validate()?;

    let catalog = ToolCatalog::from_file(&config.tools_file)
        .with_context(|| format!("Failed to load tool catalog {}", config.tools_file.display()))?;
    info!(
        "Loaded {} tools from {}",
        catalog.len(),
        config.tools_file.display()
    );

    let sandbox = WasmSandbox::new(
        WasmConfig::new(&config.functions_dir).with_max_memory_bytes(config.max_memory_bytes()),
    )
    .context("Failed to start the WASM sandbox")?;
    let registry = PluginRegistry::new(Arc::new(sandbox), config.plugin_policy);
    let executor = Executor::new(config.entry_point.as_str(), config.call_timeout());

    let app = router(
        AppState::new(catalog, registry, executor),
        BearerAuth::from_token(config.auth_token()),
    );

    serve(app, config.socket_addr()?, config.listener(), shutdown_signal())
        .await
        .context("Gateway server failed")?;
    Ok(())
}
