//! Conversion between internal [`AgentMessage`] values and the wire
//! [`ChatMessage`] shape.

use chat_event::{ChatMessage, ChatMessageType, OriginEntry};

use super::AgentMessage;

/// Converts an internal message to its wire shape, stamping the given origin.
pub fn to_chat_message(message: &AgentMessage, origin: &[OriginEntry]) -> ChatMessage {
    let mut wire = ChatMessage::text(message.kind(), message.text());
    wire.origin = Some(origin.to_vec());
    match message {
        AgentMessage::Agent { structure, .. } => {
            wire.structure = structure.clone();
        }
        AgentMessage::AgentToolResult {
            tool_result_origin, ..
        } => {
            wire.tool_result_origin = Some(tool_result_origin.clone());
        }
        AgentMessage::AgentFramework {
            structure,
            sly_data,
            chat_context,
            ..
        } => {
            wire.structure = structure.clone();
            wire.sly_data = sly_data.clone();
            wire.chat_context = chat_context.clone();
        }
        _ => {}
    }
    wire
}

/// Converts a wire message back to the internal shape.
///
/// Used when rehydrating chat history from a `ChatContext`. Unknown or
/// malformed entries yield `None` and are skipped by callers.
pub fn from_chat_message(wire: &ChatMessage) -> Option<AgentMessage> {
    let text = wire.text.clone().unwrap_or_default();
    let message = match wire.message_type {
        ChatMessageType::Human => AgentMessage::Human { text },
        ChatMessageType::System => AgentMessage::System { text },
        ChatMessageType::Ai => AgentMessage::Ai { text },
        ChatMessageType::Agent => AgentMessage::Agent {
            text,
            structure: wire.structure.clone(),
        },
        ChatMessageType::AgentToolResult => AgentMessage::AgentToolResult {
            text,
            tool_result_origin: wire.tool_result_origin.clone().unwrap_or_default(),
        },
        ChatMessageType::AgentFramework => AgentMessage::AgentFramework {
            text,
            structure: wire.structure.clone(),
            sly_data: wire.sly_data.clone(),
            chat_context: wire.chat_context.clone(),
        },
    };
    Some(message)
}
