//! Journals: append-only sinks for origin-tagged messages.
//!
//! Every message an activation produces is written to a journal together with
//! the origin of its producer. Journals compose: an [`OriginatingJournal`]
//! stamps its run context's origin and keeps the chat history, forwarding to
//! an [`InterceptingJournal`] that captures one origin's trace en route to the
//! request's root journal (typically a channel feeding the response stream).

mod intercepting;
mod originating;
mod origination;

pub use intercepting::InterceptingJournal;
pub use originating::OriginatingJournal;
pub use origination::Origination;

use async_trait::async_trait;
use chat_event::OriginEntry;

use crate::messages::AgentMessage;

/// Write sink for origin-tagged messages.
///
/// The write is asynchronous and forwarded synchronously: a writer does not
/// proceed until every wrapped journal has seen the message, which is what
/// guarantees per-origin ordering in the emitted stream.
#[async_trait]
pub trait Journal: Send + Sync {
    /// Writes one message tagged with the origin of its producer.
    async fn write_message(&self, message: &AgentMessage, origin: &[OriginEntry]);
}

/// Journal that drops everything. Used when no consumer is attached.
pub struct NullJournal;

#[async_trait]
impl Journal for NullJournal {
    async fn write_message(&self, _message: &AgentMessage, _origin: &[OriginEntry]) {}
}

/// Journal backed by a tokio channel of (message, origin) pairs.
///
/// The session layer attaches one of these as the root journal of a request
/// and reads the receiver as the response stream.
pub struct ChannelJournal {
    sender: tokio::sync::mpsc::UnboundedSender<(AgentMessage, Vec<OriginEntry>)>,
}

impl ChannelJournal {
    pub fn new() -> (
        Self,
        tokio::sync::mpsc::UnboundedReceiver<(AgentMessage, Vec<OriginEntry>)>,
    ) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Journal for ChannelJournal {
    async fn write_message(&self, message: &AgentMessage, origin: &[OriginEntry]) {
        // A closed receiver means the client went away; drop silently.
        let _ = self.sender.send((message.clone(), origin.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_journal_delivers_in_order() {
        let (journal, mut receiver) = ChannelJournal::new();
        let origin = vec![OriginEntry::new("front_man", 0)];
        journal
            .write_message(&AgentMessage::human("one"), &origin)
            .await;
        journal
            .write_message(&AgentMessage::ai("two"), &origin)
            .await;
        let (first, _) = receiver.recv().await.unwrap();
        let (second, _) = receiver.recv().await.unwrap();
        assert_eq!(first.text(), "one");
        assert_eq!(second.text(), "two");
    }
}
