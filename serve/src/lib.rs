//! HTTP server for trellis (axum).
//!
//! Routes: `POST /api/v1/:agent/streaming_chat` (newline-delimited JSON,
//! chunked), `GET /api/v1/list`, `GET /api/v1/:agent/connectivity`,
//! `GET /healthz`. Every agent route goes through the authorization policy.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`ServerConfig`].

mod app;
mod chat;
mod concierge;
mod metadata;

pub use app::{router, AppState, ServerConfig};

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Runs the server on an existing listener. Used by tests (bind to
/// `127.0.0.1:0`, then pass the listener in).
pub async fn run_serve_on_listener(
    listener: TcpListener,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("trellis server listening on http://{}", addr);
    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs the server. Listens on `addr` (default 127.0.0.1:8080).
pub async fn run_serve(
    addr: Option<&str>,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, state).await
}
