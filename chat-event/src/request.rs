//! Streaming-chat request and response-line types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::ChatContext;
use crate::message::{ChatMessage, ChatMessageType};

/// The user message of a request. `message_type` is `HUMAN` in practice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    #[serde(rename = "type")]
    pub message_type: ChatMessageType,
    pub text: String,
}

impl UserMessage {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            message_type: ChatMessageType::Human,
            text: text.into(),
        }
    }
}

/// How much of the internal chatter a client wants to see.
///
/// `Minimal` sends only front-man output and framework messages; `Maximal`
/// sends every journaled message with its origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatFilterType {
    #[default]
    #[serde(rename = "MINIMAL")]
    Minimal,
    #[serde(rename = "MAXIMAL")]
    Maximal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFilter {
    pub chat_filter_type: ChatFilterType,
}

/// One streaming-chat turn as posted by a client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<UserMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_context: Option<ChatContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sly_data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_filter: Option<ChatFilter>,
}

impl ChatRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            user_message: Some(UserMessage::human(text)),
            ..Self::default()
        }
    }

    /// The effective filter: `MINIMAL` unless the client asked otherwise.
    pub fn filter_type(&self) -> ChatFilterType {
        self.chat_filter
            .map(|f| f.chat_filter_type)
            .unwrap_or_default()
    }
}

/// One newline-delimited line of the streaming response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: ChatMessage,
}

impl ChatResponse {
    pub fn new(response: ChatMessage) -> Self {
        Self { response }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_with_only_user_message() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"user_message": {"type": "HUMAN", "text": "hi"}}"#).unwrap();
        assert_eq!(request.filter_type(), ChatFilterType::Minimal);
        assert!(request.chat_context.is_none());
        assert_eq!(request.user_message.unwrap().text, "hi");
    }

    #[test]
    fn maximal_filter_round_trips() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"user_message": {"type": "HUMAN", "text": "hi"},
                "chat_filter": {"chat_filter_type": "MAXIMAL"}}"#,
        )
        .unwrap();
        assert_eq!(request.filter_type(), ChatFilterType::Maximal);
    }

    #[test]
    fn response_line_shape() {
        let line = ChatResponse::new(ChatMessage::text(ChatMessageType::AgentFramework, "done"));
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["response"]["type"], "AGENT_FRAMEWORK");
    }
}
