//! Chat-model abstraction and the provider registry.
//!
//! A [`ChatModel`] turns a message transcript plus tool definitions into one
//! model response. The [`LlmFactory`] resolves a fully-overlaid llm config
//! into [`LlmResources`]: the model handle paired with the client-lifecycle
//! policy that knows how to release its network resources.

mod anthropic;
mod error_check;
mod factory;
mod mock;
mod openai;
mod policy;
mod token_counter;

pub use anthropic::AnthropicChat;
pub use error_check::check_for_api_key_exception;
pub use factory::{
    fallback_configs, resolve_llm_config, value_or_env, LlmClientFactory, LlmFactory,
};
pub use mock::MockChatModel;
pub use openai::OpenAiChat;
pub use policy::{ClientPolicy, NoopClientPolicy};
pub use token_counter::TokenCounter;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::messages::ChatRole;

/// One message in a model invocation transcript.
#[derive(Clone, Debug)]
pub struct ChatRecord {
    pub role: ChatRole,
    pub content: String,
}

impl ChatRecord {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A callable tool as advertised to the model.
#[derive(Clone, Debug)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON-schema object for the tool's parameters.
    pub parameters: Value,
}

/// One tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelToolCall {
    pub id: String,
    pub name: String,
    /// Parsed arguments object; an unparseable argument string is passed
    /// through as a JSON string value.
    pub arguments: Value,
}

/// Token usage for one model call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ModelUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from one chat completion: assistant text plus any tool calls.
#[derive(Clone, Debug, Default)]
pub struct ModelResponse {
    pub content: String,
    /// Empty means the model is done and `content` is the final answer.
    pub tool_calls: Vec<ModelToolCall>,
    pub usage: Option<ModelUsage>,
}

/// Chat model: given a transcript and tool definitions, produce one response.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(
        &self,
        messages: &[ChatRecord],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AgentError>;
}

/// A model handle paired with the lifecycle policy for its network client.
pub struct LlmResources {
    model: std::sync::Arc<dyn ChatModel>,
    policy: Box<dyn ClientPolicy>,
}

impl std::fmt::Debug for LlmResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmResources").finish_non_exhaustive()
    }
}

impl LlmResources {
    pub fn new(model: std::sync::Arc<dyn ChatModel>, policy: Box<dyn ClientPolicy>) -> Self {
        Self { model, policy }
    }

    pub fn model(&self) -> std::sync::Arc<dyn ChatModel> {
        std::sync::Arc::clone(&self.model)
    }

    /// Releases the network client behind the model.
    pub async fn delete_resources(&mut self) {
        self.policy.delete_resources().await;
    }
}
