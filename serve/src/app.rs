//! App state and router.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use env_config::AgentEnv;
use trellis::{AgentAuthorizationPolicy, SessionDeps};

use super::chat::streaming_chat_handler;
use super::concierge::{connectivity_handler, healthz_handler, list_handler};

/// Server-level knobs.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Umbrella timeout covering one whole streaming-chat turn.
    /// Zero means no timeout.
    pub chat_request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            chat_request_timeout: Duration::from_secs(0),
        }
    }
}

/// Shared state behind every handler.
pub struct AppState {
    pub deps: Arc<SessionDeps>,
    pub policy: Arc<AgentAuthorizationPolicy>,
    pub agent_env: AgentEnv,
    pub config: ServerConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/api/v1/list", get(list_handler))
        .route("/api/v1/:agent/connectivity", get(connectivity_handler))
        .route("/api/v1/:agent/streaming_chat", post(streaming_chat_handler))
        .with_state(state)
}
