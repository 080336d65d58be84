//! Journal that captures one origin's messages en route to a wrapped journal.

use std::sync::Arc;

use async_trait::async_trait;
use chat_event::{full_name_from_origin, OriginEntry};
use tokio::sync::Mutex;

use crate::messages::AgentMessage;

use super::Journal;

/// Forwards every message to the wrapped journal and additionally captures
/// the ones whose origin equals a target origin. Used to reconstruct one
/// sub-graph's trace without disturbing the rest of the stream.
pub struct InterceptingJournal {
    wrapped: Arc<dyn Journal>,
    origin_name: String,
    messages: Mutex<Vec<AgentMessage>>,
}

impl InterceptingJournal {
    pub fn new(wrapped: Arc<dyn Journal>, origin: &[OriginEntry]) -> Self {
        Self {
            wrapped,
            origin_name: full_name_from_origin(origin),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// The messages intercepted so far, in write order.
    pub async fn messages(&self) -> Vec<AgentMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Journal for InterceptingJournal {
    async fn write_message(&self, message: &AgentMessage, origin: &[OriginEntry]) {
        // Let the wrapped journal see everything first.
        self.wrapped.write_message(message, origin).await;

        if full_name_from_origin(origin) == self.origin_name {
            self.messages.lock().await.push(message.clone());
        }
    }
}
