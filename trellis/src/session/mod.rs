//! Sessions: driving one streaming-chat turn, locally or against a remote
//! server.
//!
//! [`DirectStreamingSession`] executes a turn against a network in this
//! process. [`HttpAgentSession`] consumes another server's streaming-chat
//! endpoint; the [`AsyncAgentSessionFactory`] seam decides which one an
//! external reference gets.

mod direct;
mod http;

pub use direct::{DirectStreamingSession, SessionDeps};
pub use http::{HttpAgentSession, StandardSessionFactory};

use async_trait::async_trait;
use chat_event::{ChatRequest, ChatResponse};
use futures::stream::BoxStream;

use crate::error::AgentError;

/// One conversational counterpart reachable by streaming chat.
#[async_trait]
pub trait AsyncAgentSession: Send + Sync {
    /// Submits one turn and returns the ordered response stream.
    ///
    /// The returned stream ends after the terminal framework message. The
    /// call itself errs only when the counterpart is unreachable.
    async fn streaming_chat(
        &self,
        request: ChatRequest,
    ) -> Result<BoxStream<'static, ChatResponse>, AgentError>;
}

/// Creates sessions for external-agent references.
pub trait AsyncAgentSessionFactory: Send + Sync {
    /// `agent_url` is a `/name` reference to an agent on this server or an
    /// `http(s)://host/api/v1/name` URL to another one.
    fn create_session(
        &self,
        agent_url: &str,
    ) -> Result<std::sync::Arc<dyn AsyncAgentSession>, AgentError>;
}

/// Factory for processes that host no networks: every reference is an error.
pub struct NoExternalSessions;

impl AsyncAgentSessionFactory for NoExternalSessions {
    fn create_session(
        &self,
        agent_url: &str,
    ) -> Result<std::sync::Arc<dyn AsyncAgentSession>, AgentError> {
        Err(AgentError::Tool(format!(
            "no session factory configured for external agent {agent_url}"
        )))
    }
}
