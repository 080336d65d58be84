//! The polymorphic unit of work and the factory that builds it.
//!
//! A [`CallableActivation`] is one tool as callable from a parent agent:
//! a sub-agent, a coded tool, a toolbox tool, or an external agent behind a
//! URL. Activations are created once per resolved tool when a run context
//! builds its resources; each `build` call is one invocation and returns the
//! messages produced for the parent, whose last AI message is the tool's
//! answer.

use std::sync::Arc;

use async_trait::async_trait;
use chat_event::{ChatContext, OriginEntry};
use serde_json::{json, Map, Value};

use crate::error::AgentError;
use crate::llm::ToolDefinition;
use crate::messages::AgentMessage;
use crate::network::{is_url_or_path, AgentKind, AgentNetwork};
use crate::run::InvocationContext;
use crate::toolbox::Tool;

use super::coded_tool::CodedToolActivation;
use super::external::ExternalActivation;
use super::llm_agent::LlmAgentActivation;
use super::toolbox_tool::ToolboxActivation;

/// What one activation invocation produced.
pub struct ActivationResult {
    /// The messages produced for the parent; the last AI message among them
    /// is the tool's answer.
    pub messages: Vec<AgentMessage>,
    /// The origin the activation ran under.
    pub origin: Vec<OriginEntry>,
}

/// One invokable unit within a request's call tree.
#[async_trait]
pub trait CallableActivation: Send + Sync {
    /// The name of the tool as it comes from the spec (or its URL).
    fn name(&self) -> &str;

    /// Runs one invocation of this tool with the given arguments.
    ///
    /// Tool-level failures come back as messages (an answer explaining the
    /// error), never as `Err`; `Err` is reserved for cancellation and other
    /// conditions that should unwind the turn.
    async fn build(&self, arguments: Map<String, Value>) -> Result<ActivationResult, AgentError>;

    async fn delete_resources(&self) {}
}

/// What a tool reference resolved to.
pub enum ToolTarget {
    /// A declared agent node: LLM agent or coded tool.
    Agent(String),
    /// A tool produced by the toolbox for a toolbox entry.
    ToolboxTool(Arc<dyn Tool>),
    /// An external agent reference (`/…` or `http(s)://…`).
    External(String),
}

/// One reference from an agent's `tools` list, resolved for tool calling.
pub struct ResolvedTool {
    /// The function name advertised to the model.
    pub advertised: String,
    pub definition: ToolDefinition,
    pub target: ToolTarget,
}

/// Builds activations for the tool references of one network.
///
/// Holds the per-request ambient state activations need, plus the request's
/// chat context so descendant run contexts can rehydrate their histories.
pub struct ActivationFactory {
    network: Arc<AgentNetwork>,
    invocation_context: Arc<InvocationContext>,
    chat_context: Option<ChatContext>,
}

impl ActivationFactory {
    pub fn new(
        network: Arc<AgentNetwork>,
        invocation_context: Arc<InvocationContext>,
        chat_context: Option<ChatContext>,
    ) -> Self {
        Self {
            network,
            invocation_context,
            chat_context,
        }
    }

    pub fn network(&self) -> &Arc<AgentNetwork> {
        &self.network
    }

    pub fn invocation_context(&self) -> &Arc<InvocationContext> {
        &self.invocation_context
    }

    pub fn chat_context(&self) -> Option<&ChatContext> {
        self.chat_context.as_ref()
    }

    /// Resolves one `tools` list reference into its advertised tools.
    ///
    /// A toolbox entry may expand to several tools; everything else resolves
    /// to exactly one.
    pub fn resolve_tools(&self, reference: &str) -> Result<Vec<ResolvedTool>, AgentError> {
        if is_url_or_path(reference) {
            return Ok(vec![ResolvedTool {
                advertised: sanitize_function_name(reference),
                definition: ToolDefinition {
                    name: sanitize_function_name(reference),
                    description: format!("External agent at {reference}"),
                    parameters: json!({
                        "type": "object",
                        "properties": {
                            "inquiry": {"type": "string", "description": "What to ask the external agent."}
                        },
                        "required": ["inquiry"]
                    }),
                },
                target: ToolTarget::External(reference.to_string()),
            }]);
        }

        let spec = self
            .network
            .agent(reference)
            .ok_or_else(|| AgentError::Internal(format!("unknown tool reference '{reference}'")))?;

        match spec.kind() {
            AgentKind::LlmAgent | AgentKind::CodedTool => {
                let description = spec
                    .function
                    .as_ref()
                    .and_then(|function| function.get("description"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| spec.instructions.clone())
                    .unwrap_or_default();
                let parameters = spec
                    .function
                    .as_ref()
                    .and_then(|function| function.get("parameters"))
                    .cloned()
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}}));
                Ok(vec![ResolvedTool {
                    advertised: sanitize_function_name(reference),
                    definition: ToolDefinition {
                        name: sanitize_function_name(reference),
                        description,
                        parameters,
                    },
                    target: ToolTarget::Agent(reference.to_string()),
                }])
            }
            AgentKind::Toolbox => {
                let tools = self
                    .invocation_context
                    .toolbox()
                    .create_tool_from_toolbox(reference, spec.args.as_ref())
                    .map_err(|e| AgentError::Tool(e.to_string()))?;
                Ok(tools
                    .into_iter()
                    .map(|tool| ResolvedTool {
                        advertised: sanitize_function_name(tool.name()),
                        definition: ToolDefinition {
                            name: sanitize_function_name(tool.name()),
                            description: tool.description().to_string(),
                            parameters: tool.parameters(),
                        },
                        target: ToolTarget::ToolboxTool(tool),
                    })
                    .collect())
            }
        }
    }

    /// Creates the activation for one resolved tool under a parent.
    ///
    /// `parent_allow` is the calling agent's `allow` tree, consulted for the
    /// sly-data flow policies of external dispatch.
    pub fn create_activation(
        self: &Arc<Self>,
        target: &ToolTarget,
        parent_origin: &[OriginEntry],
        parent_allow: Option<&Value>,
    ) -> Result<Arc<dyn CallableActivation>, AgentError> {
        match target {
            ToolTarget::Agent(name) => {
                let spec = self.network.agent(name).ok_or_else(|| {
                    AgentError::Internal(format!("unknown tool reference '{name}'"))
                })?;
                match spec.kind() {
                    AgentKind::CodedTool => Ok(Arc::new(CodedToolActivation::new(
                        spec.clone(),
                        parent_origin.to_vec(),
                        Arc::clone(&self.invocation_context),
                        self.network.name().to_string(),
                    ))),
                    _ => Ok(Arc::new(LlmAgentActivation::new(
                        spec.clone(),
                        parent_origin.to_vec(),
                        Arc::clone(self),
                    ))),
                }
            }
            ToolTarget::ToolboxTool(tool) => Ok(Arc::new(ToolboxActivation::new(
                Arc::clone(tool),
                parent_origin.to_vec(),
                Arc::clone(&self.invocation_context),
            ))),
            ToolTarget::External(url) => Ok(Arc::new(ExternalActivation::new(
                url.clone(),
                parent_origin.to_vec(),
                Arc::clone(&self.invocation_context),
                parent_allow.cloned(),
            ))),
        }
    }
}

/// Makes a spec reference safe as a model-visible function name.
pub fn sanitize_function_name(reference: &str) -> String {
    let mut name: String = reference
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    while name.starts_with('_') && name.len() > 1 {
        name.remove(0);
    }
    if name.is_empty() {
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_names_are_sanitized() {
        assert_eq!(sanitize_function_name("synonymizer"), "synonymizer");
        assert_eq!(sanitize_function_name("/other_network"), "other_network");
        assert_eq!(
            sanitize_function_name("https://host:8080/agent"),
            "https___host_8080_agent"
        );
    }
}
