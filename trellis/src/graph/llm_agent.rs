//! Activation for a downstream LLM agent.

use std::sync::Arc;

use async_trait::async_trait;
use chat_event::OriginEntry;
use serde_json::{Map, Value};

use crate::error::AgentError;
use crate::messages::AgentMessage;
use crate::network::AgentSpec;
use crate::run::RunContext;

use super::activation::{ActivationFactory, ActivationResult, CallableActivation};

/// Drives a child run context for one referenced LLM agent.
///
/// Each `build` is a fresh invocation: a new run context (and so a new
/// instantiation index) per call, which is what disambiguates concurrent
/// instances of the same tool under one parent.
pub struct LlmAgentActivation {
    spec: AgentSpec,
    parent_origin: Vec<OriginEntry>,
    factory: Arc<ActivationFactory>,
}

impl LlmAgentActivation {
    pub fn new(
        spec: AgentSpec,
        parent_origin: Vec<OriginEntry>,
        factory: Arc<ActivationFactory>,
    ) -> Self {
        Self {
            spec,
            parent_origin,
            factory,
        }
    }
}

#[async_trait]
impl CallableActivation for LlmAgentActivation {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn build(&self, arguments: Map<String, Value>) -> Result<ActivationResult, AgentError> {
        let mut run_context = RunContext::new(
            self.spec.clone(),
            &self.parent_origin,
            Arc::clone(&self.factory),
        );

        run_context
            .journal()
            .write(&AgentMessage::agent(format!(
                "Received arguments {}",
                Value::Object(arguments.clone())
            )))
            .await;

        run_context.create_resources().await?;

        // The textual input is the arguments themselves; assignment clauses
        // derived from the same arguments land in the system prompt.
        let input = Value::Object(arguments.clone()).to_string();
        let result = run_context.submit_message(&input, &arguments).await;

        let messages = run_context.get_response().await;
        let origin = run_context.origin().to_vec();
        run_context.delete_resources().await;
        result?;
        Ok(ActivationResult { messages, origin })
    }
}
