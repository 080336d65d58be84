//! External-agent sessions over HTTP, and the standard factory.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chat_event::{ChatRequest, ChatResponse};
use futures::stream::BoxStream;
use futures_util::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::error::AgentError;

use super::direct::{DirectStreamingSession, SessionDeps};
use super::{AsyncAgentSession, AsyncAgentSessionFactory};

/// Streaming-chat client against another server's endpoint.
///
/// Posts the request and reads newline-delimited JSON until the stream ends.
pub struct HttpAgentSession {
    endpoint: String,
}

impl HttpAgentSession {
    /// `agent_url` is the external reference from the network file, e.g.
    /// `https://host:8080/api/v1/research`. The streaming-chat suffix is
    /// appended when the reference does not already carry it.
    pub fn new(agent_url: &str) -> Self {
        let endpoint = if agent_url.ends_with("/streaming_chat") {
            agent_url.to_string()
        } else {
            format!("{}/streaming_chat", agent_url.trim_end_matches('/'))
        };
        Self { endpoint }
    }
}

#[async_trait]
impl AsyncAgentSession for HttpAgentSession {
    async fn streaming_chat(
        &self,
        request: ChatRequest,
    ) -> Result<BoxStream<'static, ChatResponse>, AgentError> {
        let client = reqwest::Client::new();
        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Tool(format!("connect {}: {e}", self.endpoint)))?;
        if !response.status().is_success() {
            return Err(AgentError::Tool(format!(
                "{} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(endpoint = %endpoint, error = %e, "response stream broke");
                        break;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ChatResponse>(line) {
                        Ok(parsed) => {
                            if sender.send(parsed).is_err() {
                                return; // consumer went away
                            }
                        }
                        Err(e) => debug!(endpoint = %endpoint, error = %e, "skipping unparseable line"),
                    }
                }
            }
            // Trailing line without a newline terminator.
            let line = buffer.trim();
            if !line.is_empty() {
                if let Ok(parsed) = serde_json::from_str::<ChatResponse>(line) {
                    let _ = sender.send(parsed);
                }
            }
        });

        Ok(UnboundedReceiverStream::new(receiver).boxed())
    }
}

/// The standard factory: `/name` references resolve to direct sessions on
/// this server, `http(s)://` references to HTTP sessions.
pub struct StandardSessionFactory {
    deps: Weak<SessionDeps>,
}

impl StandardSessionFactory {
    pub fn new(deps: Weak<SessionDeps>) -> Self {
        Self { deps }
    }
}

impl AsyncAgentSessionFactory for StandardSessionFactory {
    fn create_session(&self, agent_url: &str) -> Result<Arc<dyn AsyncAgentSession>, AgentError> {
        if let Some(name) = agent_url.strip_prefix('/') {
            let deps = self
                .deps
                .upgrade()
                .ok_or_else(|| AgentError::Internal("server is shutting down".to_string()))?;
            if deps.store.get(name).is_none() {
                return Err(AgentError::UnknownNetwork(name.to_string()));
            }
            let provider = deps.store.get_provider(name.to_string());
            return Ok(Arc::new(DirectStreamingSession::new(deps, provider)));
        }
        if agent_url.starts_with("http://") || agent_url.starts_with("https://") {
            return Ok(Arc::new(HttpAgentSession::new(agent_url)));
        }
        Err(AgentError::Tool(format!(
            "unrecognized external agent reference: {agent_url}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_suffix_is_appended_once() {
        assert_eq!(
            HttpAgentSession::new("https://host/api/v1/research").endpoint,
            "https://host/api/v1/research/streaming_chat"
        );
        assert_eq!(
            HttpAgentSession::new("https://host/api/v1/research/streaming_chat").endpoint,
            "https://host/api/v1/research/streaming_chat"
        );
    }
}
