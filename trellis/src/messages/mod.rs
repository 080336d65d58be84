//! Internal message model and its bridges.
//!
//! [`AgentMessage`] is what journals carry and run contexts keep as chat
//! history. The wire shape lives in the `chat-event` crate; [`convert`]
//! bridges the two. [`structure_parser`] pulls a single JSON block out of
//! response text, and [`processor`] compiles a stream of wire messages into
//! the pieces an upstream caller cares about (answer, chat context, sly data).

pub mod convert;
pub mod processor;
pub mod structure_parser;

use chat_event::{ChatContext, ChatMessageType, OriginEntry};
use serde_json::{Map, Value};

/// One message inside the runtime.
///
/// `Ai` is a final answer produced by a model. `Agent` is framework-internal
/// chatter from an activation (e.g. "Received arguments …"). The terminal
/// message of every turn is an `AgentFramework`.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentMessage {
    Human {
        text: String,
    },
    System {
        text: String,
    },
    Ai {
        text: String,
    },
    Agent {
        text: String,
        structure: Option<Value>,
    },
    AgentToolResult {
        text: String,
        tool_result_origin: Vec<OriginEntry>,
    },
    AgentFramework {
        text: String,
        structure: Option<Value>,
        sly_data: Option<Map<String, Value>>,
        chat_context: Option<ChatContext>,
    },
}

impl AgentMessage {
    pub fn human(text: impl Into<String>) -> Self {
        Self::Human { text: text.into() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::Ai { text: text.into() }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::Agent {
            text: text.into(),
            structure: None,
        }
    }

    pub fn tool_result(text: impl Into<String>, tool_result_origin: Vec<OriginEntry>) -> Self {
        Self::AgentToolResult {
            text: text.into(),
            tool_result_origin,
        }
    }

    /// The wire discriminator this message maps to.
    pub fn kind(&self) -> ChatMessageType {
        match self {
            Self::Human { .. } => ChatMessageType::Human,
            Self::System { .. } => ChatMessageType::System,
            Self::Ai { .. } => ChatMessageType::Ai,
            Self::Agent { .. } => ChatMessageType::Agent,
            Self::AgentToolResult { .. } => ChatMessageType::AgentToolResult,
            Self::AgentFramework { .. } => ChatMessageType::AgentFramework,
        }
    }

    /// The text content, whatever the variant.
    pub fn text(&self) -> &str {
        match self {
            Self::Human { text }
            | Self::System { text }
            | Self::Ai { text }
            | Self::Agent { text, .. }
            | Self::AgentToolResult { text, .. }
            | Self::AgentFramework { text, .. } => text,
        }
    }
}

/// The role a message plays when sent to a chat model.
///
/// Tool results deliberately map to `Assistant`: reporting a tool's answer as
/// if the model said it keeps every provider's message validation happy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl AgentMessage {
    /// The chat-model role for this message, or `None` when the message is
    /// framework-internal and should not be replayed to a model.
    pub fn chat_role(&self) -> Option<ChatRole> {
        match self {
            Self::System { .. } => Some(ChatRole::System),
            Self::Human { .. } => Some(ChatRole::User),
            Self::Ai { .. } | Self::AgentToolResult { .. } => Some(ChatRole::Assistant),
            Self::Agent { .. } | Self::AgentFramework { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_wire_types() {
        assert_eq!(AgentMessage::human("x").kind(), ChatMessageType::Human);
        assert_eq!(
            AgentMessage::tool_result("x", vec![]).kind(),
            ChatMessageType::AgentToolResult
        );
    }

    #[test]
    fn framework_messages_are_not_replayed_to_models() {
        assert_eq!(AgentMessage::agent("note").chat_role(), None);
        assert_eq!(
            AgentMessage::tool_result("42", vec![]).chat_role(),
            Some(ChatRole::Assistant)
        );
    }
}
