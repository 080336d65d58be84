//! Chat context: the opaque resumption token for cross-turn continuation.
//!
//! A server hands one of these back on the terminal message of a turn; the
//! client submits it verbatim with the next request, possibly to a different
//! server. It carries enough per-origin chat history to rehydrate the run
//! contexts of the previous turn.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;
use crate::origin::OriginEntry;

/// Chat history for one origin within a previous turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub origin: Vec<OriginEntry>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// The resumption token itself. Opaque to clients.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub chat_histories: Vec<ChatHistory>,
}

impl ChatContext {
    pub fn is_empty(&self) -> bool {
        self.chat_histories.is_empty()
    }
}
