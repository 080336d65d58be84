//! MCP-sourced tools, consumed through an interface only.
//!
//! The toolbox cares about two operations: list the tools a server offers and
//! call one of them. Session management, the version handshake, and transport
//! framing all live behind [`McpToolProvider`]; tests use an in-memory
//! implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::AgentError;

use super::tool::{Tool, Toolkit};

/// A tool as listed by an MCP server.
#[derive(Clone, Debug)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    /// The server's `inputSchema` for the tool.
    pub input_schema: Value,
}

/// The slice of the MCP protocol the toolbox consumes.
#[async_trait]
pub trait McpToolProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<McpToolInfo>, AgentError>;

    async fn call_tool(&self, name: &str, args: &Map<String, Value>)
        -> Result<Value, AgentError>;
}

/// One MCP-listed tool as an invokable handle.
struct McpTool {
    info: McpToolInfo,
    provider: Arc<dyn McpToolProvider>,
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn parameters(&self) -> Value {
        self.info.input_schema.clone()
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AgentError> {
        self.provider.call_tool(&self.info.name, args).await
    }
}

/// Toolkit that expands to every tool an MCP server offers.
pub struct McpToolkit {
    tools: Vec<Arc<dyn Tool>>,
}

impl McpToolkit {
    /// Lists the provider's tools once and wraps each as a handle.
    pub async fn from_provider(provider: Arc<dyn McpToolProvider>) -> Result<Self, AgentError> {
        let infos = provider.list_tools().await?;
        let tools = infos
            .into_iter()
            .map(|info| {
                Arc::new(McpTool {
                    info,
                    provider: Arc::clone(&provider),
                }) as Arc<dyn Tool>
            })
            .collect();
        Ok(Self { tools })
    }
}

impl Toolkit for McpToolkit {
    fn get_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FakeProvider;

    #[async_trait]
    impl McpToolProvider for FakeProvider {
        async fn list_tools(&self) -> Result<Vec<McpToolInfo>, AgentError> {
            Ok(vec![McpToolInfo {
                name: "echo".to_string(),
                description: "Echoes input".to_string(),
                input_schema: json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            }])
        }

        async fn call_tool(
            &self,
            name: &str,
            args: &Map<String, Value>,
        ) -> Result<Value, AgentError> {
            Ok(json!({"tool": name, "echo": args.get("text")}))
        }
    }

    #[tokio::test]
    async fn toolkit_expands_and_calls_through_provider() {
        let toolkit = McpToolkit::from_provider(Arc::new(FakeProvider)).await.unwrap();
        let tools = toolkit.get_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name(), "echo");

        let mut args = Map::new();
        args.insert("text".to_string(), json!("hi"));
        let result = tools[0].call(&args).await.unwrap();
        assert_eq!(result["echo"], "hi");
    }
}
