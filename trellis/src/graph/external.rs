//! Activation for an external agent reached over streaming chat.

use std::sync::Arc;

use async_trait::async_trait;
use chat_event::{ChatContext, ChatRequest, OriginEntry, UserMessage};
use futures_util::StreamExt;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::AgentError;
use crate::journal::OriginatingJournal;
use crate::messages::processor::MessageProcessor;
use crate::messages::AgentMessage;
use crate::run::InvocationContext;

use super::activation::{ActivationResult, CallableActivation};
use super::sly_data_redactor::SlyDataRedactor;

/// Calls another agent hierarchy as a tool through its streaming-chat
/// surface. Keeps the chat context returned by the counterpart so repeated
/// calls in the same turn continue one conversation, and merges redacted
/// returned sly data back into the shared channel.
pub struct ExternalActivation {
    agent_url: String,
    parent_origin: Vec<OriginEntry>,
    invocation_context: Arc<InvocationContext>,
    /// The calling agent's `allow` tree; governs sly-data flow both ways.
    parent_allow: Option<Value>,
    chat_context: Mutex<Option<ChatContext>>,
}

impl ExternalActivation {
    pub fn new(
        agent_url: String,
        parent_origin: Vec<OriginEntry>,
        invocation_context: Arc<InvocationContext>,
        parent_allow: Option<Value>,
    ) -> Self {
        Self {
            agent_url,
            parent_origin,
            invocation_context,
            parent_allow,
            chat_context: Mutex::new(None),
        }
    }

    /// Builds the chat request: arguments as a fenced JSON block in a human
    /// message, the previous chat context when there is one, and whatever
    /// sly data the outbound policy lets through.
    async fn gather_input(&self, arguments: &Map<String, Value>) -> ChatRequest {
        let text = format!(
            "```json\n{}```",
            Value::Object(arguments.clone())
        );
        let mut request = ChatRequest {
            user_message: Some(UserMessage::human(text)),
            ..ChatRequest::default()
        };

        if let Some(context) = self.chat_context.lock().await.clone() {
            if !context.is_empty() {
                request.chat_context = Some(context);
            }
        }

        let outbound = {
            let shared = self.invocation_context.sly_data();
            let sly_data = shared.lock().await;
            SlyDataRedactor::new(
                self.parent_allow.as_ref().map(wrap_allow).as_ref(),
                &["allow.to_downstream.sly_data", "allow.sly_data"],
            )
            .filter_config(&sly_data)
        };
        if !outbound.is_empty() {
            request.sly_data = Some(outbound);
        }
        request
    }
}

/// The redactor looks keys up under `allow.…`; the spec hands us the tree
/// below `allow`, so re-wrap it.
fn wrap_allow(allow: &Value) -> Value {
    serde_json::json!({ "allow": allow })
}

#[async_trait]
impl CallableActivation for ExternalActivation {
    fn name(&self) -> &str {
        &self.agent_url
    }

    async fn build(&self, arguments: Map<String, Value>) -> Result<ActivationResult, AgentError> {
        let origin = self
            .invocation_context
            .origination()
            .add_spec_name_to_origin(&self.parent_origin, &self.agent_url);
        let history = Arc::new(Mutex::new(Vec::new()));
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

        let request = self.gather_input(&arguments).await;

        let session = self
            .invocation_context
            .session_factory()
            .create_session(&self.agent_url);
        let responses = match session {
            Ok(session) => session.streaming_chat(request).await,
            Err(e) => Err(e),
        };
        let mut responses = match responses {
            Ok(responses) => responses,
            Err(_) => {
                // Could not reach the server for the external agent; say so
                // with a single message and stop.
                let answer = format!(
                    "Agent/tool {} was unreachable. Cannot rely on results from it as a tool.",
                    self.agent_url
                );
                info!(agent = %self.agent_url, "{answer}");
                journal.write(&AgentMessage::ai(&answer)).await;
                return Ok(ActivationResult {
                    messages: history.lock().await.clone(),
                    origin,
                });
            }
        };

        let mut processor = MessageProcessor::new();
        while let Some(response) = responses.next().await {
            processor.process_message(&response.response);
        }

        let answer = processor.compiled_answer().unwrap_or_default().to_string();
        *self.chat_context.lock().await = processor.chat_context().cloned();

        // Redact whatever sly data came back per "allow.from_downstream",
        // then merge it into the shared channel.
        if let Some(returned) = processor.take_sly_data() {
            let redacted = SlyDataRedactor::new(
                self.parent_allow.as_ref().map(wrap_allow).as_ref(),
                &["allow.from_downstream.sly_data"],
            )
            .filter_config(&returned);
            if !redacted.is_empty() {
                let shared = self.invocation_context.sly_data();
                let mut sly_data = shared.lock().await;
                for (key, value) in redacted {
                    sly_data.insert(key, value);
                }
            }
        }

        journal
            .write(&AgentMessage::agent(format!("Got result: {answer}")))
            .await;
        journal.write(&AgentMessage::ai(&answer)).await;
        let messages = history.lock().await.clone();
        Ok(ActivationResult { messages, origin })
    }

    async fn delete_resources(&self) {
        *self.chat_context.lock().await = None;
    }
}
