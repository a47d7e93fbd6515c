//! Integration tests for the WASM tool gateway
//!
//! These tests boot the gateway on an ephemeral port and talk to it over
//! real HTTP, either with the host client or with raw requests.

#![allow(unused_imports)] // Test modules only use their imports under cfg(test)
#![allow(clippy::uninlined_format_args)]
#![cfg_attr(not(test), allow(dead_code))]

pub mod auth_integration;
pub mod concurrency_integration;
pub mod end_to_end_scenarios;
pub mod wasm_plugin_integration;

/// Common test utilities for integration tests
pub mod test_utils {
    use std::io;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;
    use wasm_gateway_client::GatewayClient;
    use wasm_gateway_protocol::ToolCatalog;
    use wasm_gateway_runtime::{Executor, LoadPolicy, MockSandbox, PluginRegistry, Sandbox};
    use wasm_gateway_server::{AppState, BearerAuth, router, serve_plain};

    /// The catalog shipped with the gateway
    pub const SHIPPED_CATALOG: &[u8] = include_bytes!("../../tools/mcp.list.json");

    /// Parsed shipped catalog
    pub fn shipped_catalog() -> ToolCatalog {
        ToolCatalog::from_slice(SHIPPED_CATALOG.to_vec()).expect("shipped catalog is valid")
    }

    /// Gateway settings for one test
    #[derive(Debug, Clone)]
    pub struct GatewayOptions {
        pub catalog: ToolCatalog,
        pub policy: LoadPolicy,
        pub token: Option<String>,
        pub timeout: Duration,
    }

    impl Default for GatewayOptions {
        fn default() -> Self {
            Self {
                catalog: shipped_catalog(),
                policy: LoadPolicy::Cached,
                token: None,
                timeout: Duration::from_secs(5),
            }
        }
    }

    /// A gateway serving on a local ephemeral port
    pub struct TestGateway {
        pub addr: SocketAddr,
        shutdown: Option<oneshot::Sender<()>>,
        server: JoinHandle<io::Result<()>>,
    }

    impl TestGateway {
        /// Start a gateway over the mock demo tools
        pub async fn start_mock(sandbox: &MockSandbox, options: GatewayOptions) -> Self {
            Self::start(Arc::new(sandbox.clone()), options).await
        }

        /// Start a gateway over any sandbox
        pub async fn start(sandbox: Arc<dyn Sandbox>, options: GatewayOptions) -> Self {
            let registry = PluginRegistry::new(sandbox, options.policy);
            let executor = Executor::new("handle", options.timeout);
            let app = router(
                AppState::new(options.catalog, registry, executor),
                BearerAuth::from_token(options.token),
            );

            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            let addr = listener.local_addr().expect("local addr");
            let (tx, rx) = oneshot::channel::<()>();
            let server = tokio::spawn(serve_plain(listener, app, async move {
                let _ = rx.await;
            }));

            Self {
                addr,
                shutdown: Some(tx),
                server,
            }
        }

        /// Base URL of the gateway
        pub fn url(&self) -> String {
            format!("http://{}", self.addr)
        }

        /// Client without credentials
        pub fn client(&self) -> GatewayClient {
            GatewayClient::new(self.url()).expect("valid url")
        }

        /// Stop serving and wait for the server task
        pub async fn stop(mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
            let result = tokio::time::timeout(Duration::from_secs(5), &mut self.server)
                .await
                .expect("server stops in time")
                .expect("server task");
            result.expect("server exits cleanly");
        }
    }

    /// Wait for a condition with timeout
    pub async fn wait_for_condition<F, Fut>(
        mut condition: F,
        timeout_duration: Duration,
        check_interval: Duration,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout_duration {
            if condition().await {
                return Ok(());
            }
            tokio::time::sleep(check_interval).await;
        }
        Err("Condition timeout".into())
    }
}
