//! Provider registry and llm-config resolution.
//!
//! An agent's llm config is the agent-local table overlaid on the network
//! default overlaid on the built-in default. The factory maps the resolved
//! `class` to a registered constructor; built-ins cover the openai family
//! (openai, azure-openai, ollama, plus the OpenAI-compatible gateways of
//! gemini and bedrock) and anthropic. `register` adds extensions.

use std::collections::HashMap;
use std::sync::Arc;

use async_openai::config::{AzureConfig, OpenAIConfig};
use async_openai::Client;
use serde_json::{json, Map, Value};

use crate::error::AgentError;

use super::anthropic::{AnthropicChat, ReachInClientPolicy};
use super::openai::{ChatParams, EagerClientPolicy, OpenAiChat};
use super::LlmResources;

const DEFAULT_CLASS: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPERATURE: f64 = 0.5;

const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Constructor for one llm class.
pub trait LlmClientFactory: Send + Sync {
    /// Builds resources from a fully-resolved llm config.
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError>;
}

/// `config[key]`, else the environment variable, else `None`.
/// Empty and null config values fall through to the environment.
pub fn value_or_env(config: &Map<String, Value>, key: &str, env_var: &str) -> Option<String> {
    if let Some(value) = config.get(key) {
        match value {
            Value::String(s) => {
                if !s.is_empty() {
                    return Some(s.clone());
                }
            }
            Value::Null => {}
            other => return Some(other.to_string()),
        }
    }
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}

/// Overlays the agent-local config on the network default on the built-in
/// default, shallow per key (agent wins).
pub fn resolve_llm_config(
    network_default: Option<&Map<String, Value>>,
    agent_config: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let mut resolved = Map::new();
    resolved.insert("class".to_string(), json!(DEFAULT_CLASS));
    resolved.insert("model_name".to_string(), json!(DEFAULT_MODEL));
    resolved.insert("temperature".to_string(), json!(DEFAULT_TEMPERATURE));
    for layer in [network_default, agent_config].into_iter().flatten() {
        for (key, value) in layer {
            resolved.insert(key.clone(), value.clone());
        }
    }
    resolved
}

/// The fallback chain of a resolved config: the `fallbacks` list when one is
/// declared, else the config itself as a single-entry chain.
pub fn fallback_configs(config: &Map<String, Value>) -> Vec<Map<String, Value>> {
    if let Some(Value::Array(fallbacks)) = config.get("fallbacks") {
        let declared: Vec<Map<String, Value>> = fallbacks
            .iter()
            .filter_map(|entry| entry.as_object().cloned())
            .collect();
        if !declared.is_empty() {
            return declared;
        }
    }
    vec![config.clone()]
}

fn chat_params(config: &Map<String, Value>) -> ChatParams {
    // "model_name" is the canonical key; "model" and "model_id" are accepted
    // because user-specified configs use them interchangeably.
    let model = config
        .get("model_name")
        .or_else(|| config.get("model"))
        .or_else(|| config.get("model_id"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MODEL)
        .to_string();
    ChatParams {
        model,
        temperature: config
            .get("temperature")
            .and_then(Value::as_f64)
            .map(|t| t as f32),
        max_tokens: config
            .get("max_tokens")
            .and_then(Value::as_u64)
            .map(|t| t as u32),
    }
}

fn openai_family_resources(
    config: &Map<String, Value>,
    api_key: Option<String>,
    api_base: Option<String>,
) -> LlmResources {
    let mut openai_config = OpenAIConfig::new();
    if let Some(key) = api_key {
        openai_config = openai_config.with_api_key(key);
    }
    if let Some(base) = api_base {
        openai_config = openai_config.with_api_base(base);
    }
    if let Some(org) = value_or_env(config, "openai_organization", "OPENAI_ORG_ID") {
        openai_config = openai_config.with_org_id(org);
    }
    let client = Arc::new(Client::with_config(openai_config));
    let model = OpenAiChat::with_client(Arc::clone(&client), chat_params(config));
    LlmResources::new(
        Arc::new(model),
        Box::new(EagerClientPolicy::new(client)),
    )
}

struct OpenAiFactory;

impl LlmClientFactory for OpenAiFactory {
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let api_key = value_or_env(config, "openai_api_key", "OPENAI_API_KEY");
        let api_base = value_or_env(config, "openai_api_base", "OPENAI_API_BASE");
        Ok(openai_family_resources(config, api_key, api_base))
    }
}

struct AzureOpenAiFactory;

impl LlmClientFactory for AzureOpenAiFactory {
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let api_key = value_or_env(config, "openai_api_key", "AZURE_OPENAI_API_KEY")
            .or_else(|| value_or_env(config, "openai_api_key", "OPENAI_API_KEY"))
            .unwrap_or_default();
        let endpoint = value_or_env(config, "azure_endpoint", "AZURE_OPENAI_ENDPOINT")
            .ok_or_else(|| {
                AgentError::Provider(
                    "azure-openai requires azure_endpoint or AZURE_OPENAI_ENDPOINT".to_string(),
                )
            })?;
        let deployment = value_or_env(config, "deployment_name", "AZURE_OPENAI_DEPLOYMENT_NAME")
            .ok_or_else(|| {
                AgentError::Provider(
                    "azure-openai requires deployment_name or AZURE_OPENAI_DEPLOYMENT_NAME"
                        .to_string(),
                )
            })?;
        let api_version = value_or_env(config, "openai_api_version", "OPENAI_API_VERSION")
            .unwrap_or_else(|| "2024-10-21".to_string());

        let azure_config = AzureConfig::new()
            .with_api_base(endpoint)
            .with_api_key(api_key)
            .with_deployment_id(deployment)
            .with_api_version(api_version);
        let client = Arc::new(Client::with_config(azure_config));
        let model = OpenAiChat::with_client(Arc::clone(&client), chat_params(config));
        Ok(LlmResources::new(
            Arc::new(model),
            Box::new(EagerClientPolicy::new(client)),
        ))
    }
}

struct OllamaFactory;

impl LlmClientFactory for OllamaFactory {
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let api_base = value_or_env(config, "base_url", "OLLAMA_BASE_URL")
            .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
        // Ollama ignores the key but the client requires one.
        let api_key = value_or_env(config, "api_key", "OLLAMA_API_KEY")
            .unwrap_or_else(|| "ollama".to_string());
        Ok(openai_family_resources(config, Some(api_key), Some(api_base)))
    }
}

struct GeminiFactory;

impl LlmClientFactory for GeminiFactory {
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let api_key = value_or_env(config, "google_api_key", "GOOGLE_API_KEY");
        let api_base = value_or_env(config, "base_url", "GEMINI_OPENAI_BASE_URL")
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());
        Ok(openai_family_resources(config, api_key, Some(api_base)))
    }
}

struct BedrockFactory;

impl LlmClientFactory for BedrockFactory {
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let api_base =
            value_or_env(config, "base_url", "BEDROCK_OPENAI_BASE_URL").ok_or_else(|| {
                AgentError::Provider(
                    "bedrock requires base_url or BEDROCK_OPENAI_BASE_URL (the region's \
                     OpenAI-compatible endpoint)"
                        .to_string(),
                )
            })?;
        let api_key = value_or_env(config, "api_key", "AWS_BEARER_TOKEN_BEDROCK");
        Ok(openai_family_resources(config, api_key, Some(api_base)))
    }
}

struct AnthropicFactory;

impl LlmClientFactory for AnthropicFactory {
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let api_key =
            value_or_env(config, "anthropic_api_key", "ANTHROPIC_API_KEY").unwrap_or_default();
        let params = chat_params(config);
        let mut model = AnthropicChat::new(api_key, params.model);
        if let Some(base_url) = value_or_env(config, "base_url", "ANTHROPIC_BASE_URL") {
            model = model.with_base_url(base_url);
        }
        if let Some(temperature) = params.temperature {
            model = model.with_temperature(temperature);
        }
        if let Some(max_tokens) = params.max_tokens {
            model = model.with_max_tokens(max_tokens);
        }
        let model = Arc::new(model);
        Ok(LlmResources::new(
            Arc::clone(&model) as Arc<dyn super::ChatModel>,
            Box::new(ReachInClientPolicy::new(model)),
        ))
    }
}

/// Registry from llm class name to constructor.
pub struct LlmFactory {
    factories: HashMap<String, Arc<dyn LlmClientFactory>>,
}

impl LlmFactory {
    /// A factory with every built-in class registered.
    pub fn standard() -> Self {
        let mut factory = Self {
            factories: HashMap::new(),
        };
        factory.register("openai", Arc::new(OpenAiFactory));
        factory.register("azure-openai", Arc::new(AzureOpenAiFactory));
        factory.register("ollama", Arc::new(OllamaFactory));
        factory.register("gemini", Arc::new(GeminiFactory));
        factory.register("bedrock", Arc::new(BedrockFactory));
        factory.register("anthropic", Arc::new(AnthropicFactory));
        factory
    }

    /// Registers (or replaces) a class constructor.
    pub fn register(&mut self, class: impl Into<String>, factory: Arc<dyn LlmClientFactory>) {
        self.factories.insert(class.into().to_lowercase(), factory);
    }

    /// Builds resources for one fully-resolved config.
    pub fn create_llm(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let class = config
            .get("class")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CLASS)
            .to_lowercase();
        let factory = self.factories.get(&class).ok_or_else(|| {
            AgentError::Provider(format!("unknown llm class '{class}' in llm_config"))
        })?;
        factory.create_llm_resources(config)
    }
}

impl Default for LlmFactory {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_is_agent_over_network_over_default() {
        let mut network = Map::new();
        network.insert("model_name".to_string(), json!("gpt-4.1"));
        network.insert("temperature".to_string(), json!(0.0));
        let mut agent = Map::new();
        agent.insert("model_name".to_string(), json!("gpt-4o-mini"));

        let resolved = resolve_llm_config(Some(&network), Some(&agent));
        assert_eq!(resolved["class"], "openai");
        assert_eq!(resolved["model_name"], "gpt-4o-mini");
        assert_eq!(resolved["temperature"], 0.0);
    }

    #[test]
    fn value_or_env_prefers_config() {
        let mut config = Map::new();
        config.insert("openai_api_key".to_string(), json!("from-config"));
        std::env::set_var("TRELLIS_TEST_LLM_KEY", "from-env");
        assert_eq!(
            value_or_env(&config, "openai_api_key", "TRELLIS_TEST_LLM_KEY").as_deref(),
            Some("from-config")
        );
        assert_eq!(
            value_or_env(&Map::new(), "openai_api_key", "TRELLIS_TEST_LLM_KEY").as_deref(),
            Some("from-env")
        );
        std::env::remove_var("TRELLIS_TEST_LLM_KEY");
        assert_eq!(
            value_or_env(&Map::new(), "openai_api_key", "TRELLIS_TEST_LLM_KEY"),
            None
        );
    }

    #[test]
    fn fallback_chain_defaults_to_self() {
        let config = resolve_llm_config(None, None);
        let chain = fallback_configs(&config);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0]["class"], "openai");
    }

    #[test]
    fn declared_fallbacks_are_used_in_order() {
        let mut config = resolve_llm_config(None, None);
        config.insert(
            "fallbacks".to_string(),
            json!([
                {"class": "openai", "model_name": "gpt-4o"},
                {"class": "anthropic", "model_name": "claude-sonnet-4-0"}
            ]),
        );
        let chain = fallback_configs(&config);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1]["class"], "anthropic");
    }

    #[test]
    fn unknown_class_is_an_error() {
        let mut config = Map::new();
        config.insert("class".to_string(), json!("frontier-lab-9000"));
        let err = LlmFactory::standard().create_llm(&config).unwrap_err();
        assert!(err.to_string().contains("unknown llm class"));
    }
}
