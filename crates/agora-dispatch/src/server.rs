//! Dispatch server lifecycle management.
//!
//! [`start_server`] binds and serves until the dispatcher shuts down.
//! [`spawn_server`] binds first and serves on a background task, which
//! lets callers (and tests) bind port 0 and learn the real address.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::router::build_router;

/// Configuration for the dispatch server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8765,
        }
    }
}

/// Bind and serve until [`Dispatcher::shutdown`] is called.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, dispatcher).await
}

/// Bind now and serve on a background task.
///
/// Returns the bound address and the serving task.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or taken.
pub async fn spawn_server(
    config: &ServerConfig,
    dispatcher: Arc<Dispatcher>,
) -> Result<(SocketAddr, JoinHandle<Result<(), ServerError>>), ServerError> {
    let listener = bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("local address unavailable: {e}")))?;
    let handle = tokio::spawn(serve(listener, dispatcher));
    Ok((addr, handle))
}

async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Dispatch server listening");
    Ok(listener)
}

async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) -> Result<(), ServerError> {
    let router = build_router(Arc::clone(&dispatcher));
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { dispatcher.closed().await })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;
    info!("Dispatch server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the dispatch server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
