//! The invokable tool handle the toolbox resolves names to.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::AgentError;

/// Tag applied to every tool the toolbox produces, checked later when a
/// capability needs to know the handle came from the toolbox pipeline.
pub const LANGCHAIN_TOOL_TAG: &str = "langchain_tool";

/// An invokable tool with a name, description, and parameter schema.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-schema object describing the accepted arguments.
    fn parameters(&self) -> Value;

    /// Capability tags. Toolbox-produced tools always carry
    /// [`LANGCHAIN_TOOL_TAG`].
    fn tags(&self) -> Vec<String> {
        vec![LANGCHAIN_TOOL_TAG.to_string()]
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AgentError>;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}

/// A toolkit expands to several tools at build time.
pub trait Toolkit: Send + Sync {
    fn get_tools(&self) -> Vec<std::sync::Arc<dyn Tool>>;
}

/// What a toolbox class constructor produces.
pub enum ToolProduct {
    Single(std::sync::Arc<dyn Tool>),
    Kit(Box<dyn Toolkit>),
}

impl ToolProduct {
    /// Flattens to the list of produced tools.
    pub fn into_tools(self) -> Vec<std::sync::Arc<dyn Tool>> {
        match self {
            Self::Single(tool) => vec![tool],
            Self::Kit(kit) => kit.get_tools(),
        }
    }
}
