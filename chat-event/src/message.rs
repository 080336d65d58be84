//! Wire shape for one chat message in the streaming response.
//!
//! The runtime's internal journal messages all flatten into this one struct
//! for the wire; optional fields are left off the JSON entirely when absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::ChatContext;
use crate::origin::OriginEntry;

/// Kind discriminator for a [`ChatMessage`].
///
/// `Ai` is a final answer from an LLM; `Agent` is internal agent chatter;
/// `AgentToolResult` carries a tool's answer back up the call tree;
/// `AgentFramework` is runtime-originated (the terminal message of every
/// turn is one of these).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMessageType {
    #[serde(rename = "HUMAN")]
    Human,
    #[serde(rename = "SYSTEM")]
    System,
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "AGENT")]
    Agent,
    #[serde(rename = "AGENT_TOOL_RESULT")]
    AgentToolResult,
    #[serde(rename = "AGENT_FRAMEWORK")]
    AgentFramework,
}

/// One message on the wire.
///
/// Which optional fields are populated depends on the type: `structure` on
/// AGENT/AGENT_FRAMEWORK, `tool_result_origin` on AGENT_TOOL_RESULT,
/// `sly_data` and `chat_context` only on the terminal AGENT_FRAMEWORK
/// message. `additional_kwargs` is opaque passthrough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub message_type: ChatMessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec<OriginEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result_origin: Option<Vec<OriginEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sly_data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_context: Option<ChatContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_kwargs: Option<Map<String, Value>>,
}

impl ChatMessage {
    /// A message of the given type with text content and nothing else set.
    pub fn text(message_type: ChatMessageType, text: impl Into<String>) -> Self {
        Self {
            message_type,
            text: Some(text.into()),
            structure: None,
            origin: None,
            tool_result_origin: None,
            sly_data: None,
            chat_context: None,
            additional_kwargs: None,
        }
    }

    pub fn with_origin(mut self, origin: Vec<OriginEntry>) -> Self {
        self.origin = Some(origin);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_are_screaming_snake() {
        let msg = ChatMessage::text(ChatMessageType::AgentFramework, "done");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "AGENT_FRAMEWORK");
        assert_eq!(value["text"], "done");
    }

    #[test]
    fn absent_fields_are_omitted() {
        let msg = ChatMessage::text(ChatMessageType::Human, "hi");
        let value = serde_json::to_value(&msg).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("structure"));
        assert!(!obj.contains_key("sly_data"));
        assert!(!obj.contains_key("chat_context"));
    }

    #[test]
    fn round_trips_with_origin() {
        let msg = ChatMessage::text(ChatMessageType::Ai, "answer")
            .with_origin(vec![OriginEntry::new("front_man", 0)]);
        let text = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(back, msg);
    }
}
