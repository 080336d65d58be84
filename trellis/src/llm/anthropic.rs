//! Anthropic messages-API chat adapter.
//!
//! Anthropic's native surface differs enough from chat completions to keep
//! its own adapter: the system prompt is a separate field, tool schemas are
//! `input_schema`, and results come back as typed content blocks. The HTTP
//! client is built lazily on first use; the lifecycle policy reaches in and
//! drops it on `delete_resources`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::messages::ChatRole;

use super::policy::ClientPolicy;
use super::{ChatModel, ChatRecord, ModelResponse, ModelToolCall, ModelUsage, ToolDefinition};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Chat model over the Anthropic messages API.
pub struct AnthropicChat {
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: u32,
    client: Mutex<Option<reqwest::Client>>,
}

impl AnthropicChat {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            temperature: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            client: Mutex::new(None),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn client(&self) -> reqwest::Client {
        let mut guard = self.client.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .get_or_insert_with(reqwest::Client::new)
            .clone()
    }

    /// Drops the lazily-built client. Called by the reach-in policy.
    pub fn shutdown_client(&self) {
        let mut guard = self.client.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    fn build_body(&self, messages: &[ChatRecord], tools: &[ToolDefinition]) -> Value {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut chat: Vec<Value> = Vec::new();
        for record in messages {
            match record.role {
                ChatRole::System => system_parts.push(&record.content),
                ChatRole::User => chat.push(json!({"role": "user", "content": record.content})),
                ChatRole::Assistant => {
                    chat.push(json!({"role": "assistant", "content": record.content}))
                }
            }
        }

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": chat,
        });
        if !system_parts.is_empty() {
            body["system"] = Value::String(system_parts.join("\n"));
        }
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }
        if !tools.is_empty() {
            let tool_values: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "input_schema": tool.parameters,
                    })
                })
                .collect();
            body["tools"] = Value::Array(tool_values);
        }
        body
    }
}

#[async_trait]
impl ChatModel for AnthropicChat {
    async fn invoke(
        &self,
        messages: &[ChatRecord],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AgentError> {
        let body = self.build_body(messages, tools);
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let response = self
            .client()
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;
        if !status.is_success() {
            let message = payload
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            return Err(AgentError::Provider(format!(
                "anthropic {}: {}",
                status, message
            )));
        }

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in payload
            .get("content")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            match block.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(Value::as_str) {
                        content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    tool_calls.push(ModelToolCall {
                        id: block
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        name: block
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        arguments: block.get("input").cloned().unwrap_or(Value::Null),
                    });
                }
                _ => {}
            }
        }

        let usage = payload.get("usage").map(|usage| {
            let prompt = usage
                .get("input_tokens")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;
            let completion = usage
                .get("output_tokens")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;
            ModelUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }
        });

        Ok(ModelResponse {
            content,
            tool_calls,
            usage,
        })
    }
}

/// Reach-in lifecycle for models that construct their client lazily.
pub struct ReachInClientPolicy {
    model: Option<Arc<AnthropicChat>>,
}

impl ReachInClientPolicy {
    pub fn new(model: Arc<AnthropicChat>) -> Self {
        Self { model: Some(model) }
    }
}

#[async_trait]
impl ClientPolicy for ReachInClientPolicy {
    async fn delete_resources(&mut self) {
        if let Some(model) = self.model.take() {
            model.shutdown_client();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_separates_system_and_chat() {
        let chat = AnthropicChat::new("key", "claude-sonnet-4-0");
        let body = chat.build_body(
            &[
                ChatRecord::new(ChatRole::System, "You are terse."),
                ChatRecord::new(ChatRole::User, "hi"),
                ChatRecord::new(ChatRole::Assistant, "hello"),
            ],
            &[],
        );
        assert_eq!(body["system"], "You are terse.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn tools_become_input_schemas() {
        let chat = AnthropicChat::new("key", "claude-sonnet-4-0");
        let body = chat.build_body(
            &[ChatRecord::new(ChatRole::User, "hi")],
            &[ToolDefinition {
                name: "lookup".to_string(),
                description: "Looks things up".to_string(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            }],
        );
        assert_eq!(body["tools"][0]["name"], "lookup");
        assert!(body["tools"][0]["input_schema"].is_object());
    }

    #[tokio::test]
    async fn reach_in_policy_drops_lazy_client() {
        let chat = Arc::new(AnthropicChat::new("key", "claude-sonnet-4-0"));
        let _ = chat.client();
        let mut policy = ReachInClientPolicy::new(Arc::clone(&chat));
        policy.delete_resources().await;
        assert!(chat.client.lock().unwrap().is_none());
    }
}
