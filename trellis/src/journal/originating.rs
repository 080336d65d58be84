//! Journal that stamps its run context's origin and owns the chat history.

use std::sync::Arc;

use async_trait::async_trait;
use chat_event::OriginEntry;
use tokio::sync::Mutex;

use crate::messages::AgentMessage;

use super::Journal;

/// Stamps outgoing messages with the owning run context's origin and appends
/// them to the in-memory chat history before forwarding.
///
/// The chat history is the same `Arc` the run context reads when composing
/// the next model invocation, so append order here is chat order there.
pub struct OriginatingJournal {
    wrapped: Arc<dyn Journal>,
    origin: Vec<OriginEntry>,
    chat_history: Arc<Mutex<Vec<AgentMessage>>>,
}

impl OriginatingJournal {
    pub fn new(
        wrapped: Arc<dyn Journal>,
        origin: Vec<OriginEntry>,
        chat_history: Arc<Mutex<Vec<AgentMessage>>>,
    ) -> Self {
        Self {
            wrapped,
            origin,
            chat_history,
        }
    }

    pub fn origin(&self) -> &[OriginEntry] {
        &self.origin
    }

    /// Writes a message under this journal's own origin.
    pub async fn write(&self, message: &AgentMessage) {
        self.write_message(message, &self.origin).await;
    }
}

#[async_trait]
impl Journal for OriginatingJournal {
    async fn write_message(&self, message: &AgentMessage, origin: &[OriginEntry]) {
        {
            let mut history = self.chat_history.lock().await;
            history.push(message.clone());
        }
        self.wrapped.write_message(message, origin).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::ChannelJournal;

    #[tokio::test]
    async fn appends_to_history_then_forwards() {
        let (root, mut receiver) = ChannelJournal::new();
        let history = Arc::new(Mutex::new(Vec::new()));
        let origin = vec![OriginEntry::new("front_man", 0)];
        let journal = OriginatingJournal::new(Arc::new(root), origin.clone(), history.clone());

        journal.write(&AgentMessage::human("hello")).await;

        assert_eq!(history.lock().await.len(), 1);
        let (forwarded, forwarded_origin) = receiver.recv().await.unwrap();
        assert_eq!(forwarded.text(), "hello");
        assert_eq!(forwarded_origin, origin);
    }
}
