//! HTTP server lifecycle management.
//!
//! Provides [`start_server`] which binds to a TCP port and serves the
//! environment API until `Ctrl-C` is received.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, lookup_host};
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Address the server binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// Resolve the host (an IPv4 or IPv6 literal, or a name such as
    /// `localhost`) and port into the first matching socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the host cannot be resolved.
    pub async fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let mut addrs = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| ServerError::Bind(format!("cannot resolve {:?}: {e}", self.host)))?;
        addrs
            .next()
            .ok_or_else(|| ServerError::Bind(format!("no address found for {:?}", self.host)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8000,
        }
    }
}

/// Start the environment HTTP server.
///
/// Binds to the configured address, builds the router, and serves
/// requests until `Ctrl-C`. Returns `Ok(())` on clean shutdown.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = config.socket_addr().await?;
    let task = state.task;
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, %task, "environment server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("environment server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, shutting down");
    }
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
