//! Scripted chat model for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;

use super::{ChatModel, ChatRecord, ModelResponse, ToolDefinition};

/// Plays back a fixed script of responses, one per invocation. When the
/// script runs dry it repeats the last response, so simple tests can script
/// a single answer.
pub struct MockChatModel {
    script: Mutex<VecDeque<ModelResponse>>,
    last: Mutex<Option<ModelResponse>>,
    invocations: Mutex<Vec<Vec<ChatRecord>>>,
}

impl MockChatModel {
    pub fn new(script: Vec<ModelResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// A model that always answers with the same text and no tool calls.
    pub fn fixed(content: impl Into<String>) -> Self {
        Self::new(vec![ModelResponse {
            content: content.into(),
            ..ModelResponse::default()
        }])
    }

    /// The transcripts of every invocation so far, for assertions.
    pub fn invocations(&self) -> Vec<Vec<ChatRecord>> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn invoke(
        &self,
        messages: &[ChatRecord],
        _tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AgentError> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());

        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = script.pop_front() {
            *last = Some(next.clone());
            return Ok(next);
        }
        last.clone()
            .ok_or_else(|| AgentError::Provider("mock script is empty".to_string()))
    }
}
