//! Listener setup for plain HTTP and HTTPS

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Time in-flight requests get to finish once shutdown starts
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// How the gateway accepts connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listener {
    /// Plain HTTP
    Plain,
    /// HTTPS with a PEM certificate chain and private key
    Tls {
        /// Certificate chain
        cert: PathBuf,
        /// Private key
        key: PathBuf,
    },
}

/// Bind `addr` and serve `app` until `shutdown` resolves
pub async fn serve<F>(app: Router, addr: SocketAddr, listener: Listener, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    match listener {
        Listener::Plain => {
            let listener = TcpListener::bind(addr).await?;
            serve_plain(listener, app, shutdown).await
        }
        Listener::Tls { cert, key } => serve_tls(addr, &cert, &key, app, shutdown).await,
    }
}

/// Serve plain HTTP on an already bound listener
pub async fn serve_plain<F>(listener: TcpListener, app: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("🌍 Gateway listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Gateway stopped");
    Ok(())
}

async fn serve_tls<F>(addr: SocketAddr, cert: &Path, key: &Path, app: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let tls = RustlsConfig::from_pem_file(cert, key).await?;

    let handle = Handle::new();
    let trigger = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        trigger.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!("🔒 Gateway listening on https://{}", addr);
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
