//! Built-in web fetch tool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::AgentError;

use super::tool::{Tool, ToolProduct};
use super::{ToolConstructor, ToolboxError};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_BYTES: usize = 262_144;

/// Fetches a URL and returns the body as text, truncated to `max_bytes`.
pub struct WebFetchTool {
    name: String,
    description: String,
    parameters: Value,
    timeout: Duration,
    max_bytes: usize,
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AgentError> {
        let url = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Tool("web_fetch requires a 'url' argument".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AgentError::Tool(e.to_string()))?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| AgentError::Tool(format!("fetch {url}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Tool(format!("read {url}: {e}")))?;

        let mut text = body;
        if text.len() > self.max_bytes {
            text.truncate(self.max_bytes);
        }
        Ok(json!({"status": status.as_u16(), "content": text}))
    }
}

/// Constructor registered under class `web.WebFetch`.
pub struct WebFetchConstructor;

impl ToolConstructor for WebFetchConstructor {
    fn accepted_args(&self) -> &'static [&'static str] {
        &["timeout_seconds", "max_bytes"]
    }

    fn construct(
        &self,
        name: &str,
        description: &str,
        parameters: &Value,
        args: &Map<String, Value>,
    ) -> Result<ToolProduct, ToolboxError> {
        let timeout_seconds = args
            .get("timeout_seconds")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        let max_bytes = args
            .get("max_bytes")
            .and_then(Value::as_u64)
            .map(|b| b as usize)
            .unwrap_or(DEFAULT_MAX_BYTES);
        Ok(ToolProduct::Single(Arc::new(WebFetchTool {
            name: name.to_string(),
            description: description.to_string(),
            parameters: parameters.clone(),
            timeout: Duration::from_secs(timeout_seconds),
            max_bytes,
        })))
    }
}
