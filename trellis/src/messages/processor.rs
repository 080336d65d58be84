//! Compiles a stream of wire messages into the pieces a caller keeps.
//!
//! Both the external-agent activation and client-side consumers read a
//! streaming-chat response the same way: feed every message through a
//! processor, then ask it for the compiled answer, the chat context for the
//! next turn, and any returned sly data.

use chat_event::{ChatContext, ChatMessage, ChatMessageType};
use serde_json::{Map, Value};

/// Accumulates the interesting parts of one streaming-chat response.
#[derive(Debug, Default)]
pub struct MessageProcessor {
    answer: Option<String>,
    structure: Option<Value>,
    chat_context: Option<ChatContext>,
    sly_data: Option<Map<String, Value>>,
}

impl MessageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one response message through the processor.
    pub fn process_message(&mut self, message: &ChatMessage) {
        match message.message_type {
            ChatMessageType::Ai => {
                if let Some(text) = &message.text {
                    self.answer = Some(text.clone());
                }
            }
            ChatMessageType::AgentFramework => {
                if let Some(text) = &message.text {
                    if !text.is_empty() {
                        self.answer = Some(text.clone());
                    }
                }
                if message.structure.is_some() {
                    self.structure = message.structure.clone();
                }
                if message.chat_context.is_some() {
                    self.chat_context = message.chat_context.clone();
                }
                if message.sly_data.is_some() {
                    self.sly_data = message.sly_data.clone();
                }
            }
            _ => {}
        }
    }

    /// The compiled answer: the terminal framework text, or the last AI text.
    pub fn compiled_answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn structure(&self) -> Option<&Value> {
        self.structure.as_ref()
    }

    /// The chat context to submit on the next turn, when the server sent one.
    pub fn chat_context(&self) -> Option<&ChatContext> {
        self.chat_context.as_ref()
    }

    pub fn sly_data(&self) -> Option<&Map<String, Value>> {
        self.sly_data.as_ref()
    }

    pub fn take_sly_data(&mut self) -> Option<Map<String, Value>> {
        self.sly_data.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_text_wins_over_earlier_ai() {
        let mut processor = MessageProcessor::new();
        processor.process_message(&ChatMessage::text(ChatMessageType::Ai, "draft"));
        processor.process_message(&ChatMessage::text(ChatMessageType::AgentFramework, "final"));
        assert_eq!(processor.compiled_answer(), Some("final"));
    }

    #[test]
    fn empty_framework_text_keeps_last_ai_answer() {
        let mut processor = MessageProcessor::new();
        processor.process_message(&ChatMessage::text(ChatMessageType::Ai, "answer"));
        processor.process_message(&ChatMessage::text(ChatMessageType::AgentFramework, ""));
        assert_eq!(processor.compiled_answer(), Some("answer"));
    }

    #[test]
    fn chat_context_and_sly_data_are_captured() {
        let mut message = ChatMessage::text(ChatMessageType::AgentFramework, "done");
        message.chat_context = Some(ChatContext::default());
        let mut sly = Map::new();
        sly.insert("token".to_string(), serde_json::json!("abc"));
        message.sly_data = Some(sly.clone());

        let mut processor = MessageProcessor::new();
        processor.process_message(&message);
        assert!(processor.chat_context().is_some());
        assert_eq!(processor.sly_data(), Some(&sly));
    }
}
