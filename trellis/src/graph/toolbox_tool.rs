//! Activation for one toolbox-produced tool.

use std::sync::Arc;

use async_trait::async_trait;
use chat_event::OriginEntry;
use serde_json::{Map, Value};

use crate::error::AgentError;
use crate::journal::OriginatingJournal;
use crate::messages::AgentMessage;
use crate::run::InvocationContext;
use crate::toolbox::Tool;

use super::activation::{ActivationResult, CallableActivation};

/// Invokes one tool handle resolved by the toolbox, validating the inputs
/// against the tool's parameter schema first.
pub struct ToolboxActivation {
    tool: Arc<dyn Tool>,
    parent_origin: Vec<OriginEntry>,
    invocation_context: Arc<InvocationContext>,
}

impl ToolboxActivation {
    pub fn new(
        tool: Arc<dyn Tool>,
        parent_origin: Vec<OriginEntry>,
        invocation_context: Arc<InvocationContext>,
    ) -> Self {
        Self {
            tool,
            parent_origin,
            invocation_context,
        }
    }

    /// Required keys per the tool's schema that the arguments are missing.
    fn missing_required(&self, arguments: &Map<String, Value>) -> Vec<String> {
        self.tool
            .parameters()
            .get("required")
            .and_then(Value::as_array)
            .map(|required| {
                required
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|key| !arguments.contains_key(*key))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl CallableActivation for ToolboxActivation {
    fn name(&self) -> &str {
        self.tool.name()
    }

    async fn build(&self, arguments: Map<String, Value>) -> Result<ActivationResult, AgentError> {
        let origin = self
            .invocation_context
            .origination()
            .add_spec_name_to_origin(&self.parent_origin, self.tool.name());
        let history = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let journal = OriginatingJournal::new(
            self.invocation_context.journal(),
            origin.clone(),
            Arc::clone(&history),
        );

        journal
            .write(&AgentMessage::agent(format!(
                "Received arguments {}",
                Value::Object(arguments.clone())
            )))
            .await;

        let missing = self.missing_required(&arguments);
        let answer = if !missing.is_empty() {
            format!(
                "Error: missing required argument(s) {} for tool {}",
                missing.join(", "),
                self.tool.name()
            )
        } else {
            match self.tool.call(&arguments).await {
                Ok(Value::String(text)) => text,
                Ok(other) => other.to_string(),
                Err(e) => format!("Error: {e}"),
            }
        };

        journal.write(&AgentMessage::ai(&answer)).await;
        let messages = history.lock().await.clone();
        Ok(ActivationResult { messages, origin })
    }
}
