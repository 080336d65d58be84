//! OpenAI-compatible chat adapter.
//!
//! One adapter covers every provider that speaks the OpenAI chat-completions
//! surface: OpenAI itself, Azure OpenAI, Ollama, and the OpenAI-compatible
//! gateways of Gemini and Bedrock. The network client is constructed eagerly
//! by the factory and shared with the lifecycle policy, which drops its
//! reference on `delete_resources`.

use std::sync::Arc;

use async_openai::config::Config;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::messages::ChatRole;

use super::policy::ClientPolicy;
use super::{ChatModel, ChatRecord, ModelResponse, ModelToolCall, ModelUsage, ToolDefinition};

/// Per-invocation parameters shared by every OpenAI-compatible class.
#[derive(Clone, Debug, Default)]
pub struct ChatParams {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Chat model over any `async-openai` config (standard or Azure).
pub struct OpenAiChat<C: Config> {
    client: Arc<Client<C>>,
    params: ChatParams,
}

impl<C: Config + Send + Sync> OpenAiChat<C> {
    /// Wraps an eagerly-constructed client. The same `Arc` goes to the
    /// lifecycle policy.
    pub fn with_client(client: Arc<Client<C>>, params: ChatParams) -> Self {
        Self { client, params }
    }

    fn build_messages(records: &[ChatRecord]) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        let mut messages = Vec::with_capacity(records.len());
        for record in records {
            let message: ChatCompletionRequestMessage = match record.role {
                ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(record.content.as_str())
                    .build()
                    .map_err(|e| AgentError::Provider(e.to_string()))?
                    .into(),
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(record.content.as_str())
                    .build()
                    .map_err(|e| AgentError::Provider(e.to_string()))?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(record.content.as_str())
                    .build()
                    .map_err(|e| AgentError::Provider(e.to_string()))?
                    .into(),
            };
            messages.push(message);
        }
        Ok(messages)
    }
}

#[async_trait]
impl<C: Config + Send + Sync> ChatModel for OpenAiChat<C> {
    async fn invoke(
        &self,
        messages: &[ChatRecord],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AgentError> {
        let request_messages = Self::build_messages(messages)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.params.model).messages(request_messages);
        if let Some(temperature) = self.params.temperature {
            builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.params.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if !tools.is_empty() {
            let mut request_tools = Vec::with_capacity(tools.len());
            for tool in tools {
                let function = FunctionObjectArgs::default()
                    .name(&tool.name)
                    .description(&tool.description)
                    .parameters(tool.parameters.clone())
                    .build()
                    .map_err(|e| AgentError::Provider(e.to_string()))?;
                request_tools.push(ChatCompletionTools::Function(ChatCompletionTool {
                    function,
                }));
            }
            builder.tools(request_tools);
        }
        let request = builder
            .build()
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("empty choices in completion".to_string()))?;

        let mut tool_calls = Vec::new();
        for call in choice.message.tool_calls.unwrap_or_default() {
            if let async_openai::types::chat::ChatCompletionMessageToolCalls::Function(call) = call {
                let arguments: Value = serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments.clone()));
                tool_calls.push(ModelToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments,
                });
            }
        }

        Ok(ModelResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage: response.usage.map(|usage| ModelUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
        })
    }
}

/// Eager-client lifecycle: owns a reference to the shared client and drops it.
pub struct EagerClientPolicy<C: Config + Send + Sync> {
    client: Option<Arc<Client<C>>>,
}

impl<C: Config + Send + Sync> EagerClientPolicy<C> {
    pub fn new(client: Arc<Client<C>>) -> Self {
        Self {
            client: Some(client),
        }
    }
}

#[async_trait]
impl<C: Config + Send + Sync> ClientPolicy for EagerClientPolicy<C> {
    async fn delete_resources(&mut self) {
        self.client = None;
    }
}
