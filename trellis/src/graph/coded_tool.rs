//! Activation for a code-backed tool.

use std::sync::Arc;

use async_trait::async_trait;
use chat_event::OriginEntry;
use serde_json::{Map, Value};

use crate::coded::search_prefixes;
use crate::error::AgentError;
use crate::journal::OriginatingJournal;
use crate::messages::AgentMessage;
use crate::network::AgentSpec;
use crate::run::InvocationContext;

use super::activation::{ActivationResult, CallableActivation};

/// Resolves and invokes a coded tool, sharing the request's sly data.
///
/// Whatever the tool raises is converted to an `"Error: …"` answer so the
/// parent chain can keep going.
pub struct CodedToolActivation {
    spec: AgentSpec,
    parent_origin: Vec<OriginEntry>,
    invocation_context: Arc<InvocationContext>,
    network_name: String,
}

impl CodedToolActivation {
    pub fn new(
        spec: AgentSpec,
        parent_origin: Vec<OriginEntry>,
        invocation_context: Arc<InvocationContext>,
        network_name: String,
    ) -> Self {
        Self {
            spec,
            parent_origin,
            invocation_context,
            network_name,
        }
    }
}

#[async_trait]
impl CallableActivation for CodedToolActivation {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn build(&self, arguments: Map<String, Value>) -> Result<ActivationResult, AgentError> {
        let origin = self
            .invocation_context
            .origination()
            .add_spec_name_to_origin(&self.parent_origin, &self.spec.name);
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

        let class = self.spec.class.clone().unwrap_or_default();
        let prefixes = search_prefixes(&self.network_name);
        let Some(tool) = self
            .invocation_context
            .coded_tools()
            .resolve(&class, &prefixes)
        else {
            let answer = format!("Error: coded tool class '{class}' could not be resolved");
            journal.write(&AgentMessage::ai(&answer)).await;
            return Ok(ActivationResult {
                messages: history.lock().await.clone(),
                origin,
            });
        };

        let shared = self.invocation_context.sly_data();
        let result = {
            let mut sly_data = shared.lock().await;
            tool.invoke(&arguments, &mut sly_data).await
        };

        let answer = match result {
            Ok(value) => match value {
                Value::String(text) => text,
                other => other.to_string(),
            },
            Err(message) => format!("Error: {message}"),
        };

        journal
            .write(&AgentMessage::agent(format!("Got result: {answer}")))
            .await;
        journal.write(&AgentMessage::ai(&answer)).await;
        let messages = history.lock().await.clone();
        Ok(ActivationResult { messages, origin })
    }
}
