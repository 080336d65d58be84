//! Per-agent-invocation execution scope.
//!
//! A run context owns the chat history for one agent invocation, the model
//! resources behind it, and the activations of its referenced tools. One
//! turn inside it walks the state machine
//! `PromptReady → Invoking → (ToolCallsPending → ToolRunning → Invoking)* → Final`,
//! bounded by `max_execution_seconds` for the whole chain call and by a
//! recursion limit derived from `max_iterations` for the tool-calling depth.

use std::sync::Arc;
use std::time::Duration;

use chat_event::{full_name_from_origin, ChatContext, OriginEntry};
use futures::future::join_all;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::{ActivationFactory, CallableActivation, ResolvedTool};
use crate::journal::{InterceptingJournal, Journal, OriginatingJournal};
use crate::llm::{
    check_for_api_key_exception, fallback_configs, resolve_llm_config, ChatRecord, LlmResources,
    ModelResponse, ToolDefinition,
};
use crate::messages::AgentMessage;
use crate::network::AgentSpec;

use super::argument_assigner::ArgumentAssigner;
use super::error_detector::ErrorDetector;
use super::invocation_context::InvocationContext;
use super::run::Run;

const MINUTES: u64 = 60;
const DEFAULT_MAX_EXECUTION_SECONDS: u64 = 2 * MINUTES;
const DEFAULT_MAX_ITERATIONS: u32 = 20;
const MODEL_RETRIES: u32 = 3;

/// The documented shape of the recoverable output-parse failure. When a
/// provider chain surfaces this wrapper, the agent's real output is inside it
/// and is recovered as the answer.
const PARSE_ERROR_PREFIX: &str = "An output parsing error occurred. \
In order to pass this error back to the agent and have it try again, \
pass `handle_parsing_errors=True` to the AgentExecutor. \
This is the error: Could not parse LLM output: `";

struct ActiveTool {
    resolved: ResolvedTool,
    activation: Arc<dyn CallableActivation>,
}

/// Execution scope for one agent invocation.
pub struct RunContext {
    agent_spec: AgentSpec,
    origin: Vec<OriginEntry>,
    full_name: String,
    chat_history: Arc<Mutex<Vec<AgentMessage>>>,
    journal: Arc<OriginatingJournal>,
    interceptor: Arc<InterceptingJournal>,
    llm_resources: Mutex<Vec<LlmResources>>,
    tools: Vec<ActiveTool>,
    error_detector: ErrorDetector,
    invocation_context: Arc<InvocationContext>,
    factory: Arc<ActivationFactory>,
    run_id_base: String,
    last_run: Mutex<Option<Run>>,
    resources_created: bool,
}

impl RunContext {
    /// Builds the scope for `agent_spec` under `parent_origin`, rehydrating
    /// chat history from the request's chat context when an entry with this
    /// context's origin is present.
    pub fn new(
        agent_spec: AgentSpec,
        parent_origin: &[OriginEntry],
        factory: Arc<ActivationFactory>,
    ) -> Self {
        let invocation_context = Arc::clone(factory.invocation_context());
        let origin = invocation_context
            .origination()
            .add_spec_name_to_origin(parent_origin, &agent_spec.name);
        let full_name = full_name_from_origin(&origin);

        let mut history = Vec::new();
        if let Some(chat_context) = factory.chat_context() {
            history = rehydrate_history(chat_context, &full_name);
        }
        let chat_history = Arc::new(Mutex::new(history));

        let interceptor = Arc::new(InterceptingJournal::new(
            invocation_context.journal(),
            &origin,
        ));
        let journal = Arc::new(OriginatingJournal::new(
            Arc::clone(&interceptor) as Arc<dyn Journal>,
            origin.clone(),
            Arc::clone(&chat_history),
        ));

        let error_detector =
            ErrorDetector::new(full_name.clone(), agent_spec.error_fragments.clone());

        Self {
            agent_spec,
            origin,
            full_name,
            chat_history,
            journal,
            interceptor,
            llm_resources: Mutex::new(Vec::new()),
            tools: Vec::new(),
            error_detector,
            invocation_context,
            factory,
            run_id_base: uuid::Uuid::new_v4().to_string(),
            last_run: Mutex::new(None),
            resources_created: false,
        }
    }

    /// The run handle of the most recent `submit_message`, if any.
    pub async fn last_run(&self) -> Option<Run> {
        self.last_run.lock().await.clone()
    }

    pub fn origin(&self) -> &[OriginEntry] {
        &self.origin
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn journal(&self) -> &Arc<OriginatingJournal> {
        &self.journal
    }

    /// The messages intercepted for this context's own origin.
    pub async fn intercepted_messages(&self) -> Vec<AgentMessage> {
        self.interceptor.messages().await
    }

    /// Creates model resources and tool activations. Idempotent; creating
    /// twice would leak run-time resources, so a second call is a no-op.
    pub async fn create_resources(&mut self) -> Result<(), AgentError> {
        if self.resources_created {
            return Ok(());
        }

        let network = self.factory.network();
        let llm_config = resolve_llm_config(
            network.default_llm_config(),
            self.agent_spec.llm_config.as_ref(),
        );
        let llm_factory = self.invocation_context.llm_factory();
        let mut resources = Vec::new();
        for fallback in fallback_configs(&llm_config) {
            resources.push(llm_factory.create_llm(&fallback)?);
        }
        *self.llm_resources.lock().await = resources;

        let factory = Arc::clone(&self.factory);
        for reference in self.agent_spec.tools.clone() {
            for resolved in factory.resolve_tools(&reference)? {
                let activation = factory.create_activation(
                    &resolved.target,
                    &self.origin,
                    self.agent_spec.allow.as_ref(),
                )?;
                self.tools.push(ActiveTool {
                    resolved,
                    activation,
                });
            }
        }

        self.resources_created = true;
        Ok(())
    }

    /// Submits one user message and drives the chain to its final answer.
    ///
    /// Returns the final output text; the full trace is in the chat history
    /// and has already flowed through the journal.
    pub async fn submit_message(
        &self,
        user_message: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, AgentError> {
        // First turn in this context gets the system prompt journaled ahead
        // of the conversation. Framework chatter may already be in the
        // history, so the check is for an existing system message.
        let needs_system_prompt = {
            let history = self.chat_history.lock().await;
            !history
                .iter()
                .any(|message| matches!(message, AgentMessage::System { .. }))
        };
        if needs_system_prompt {
            let prompt = self.build_system_prompt(arguments);
            self.journal.write(&AgentMessage::system(prompt)).await;
        }
        self.journal
            .write(&AgentMessage::human(user_message))
            .await;
        *self.last_run.lock().await = Some(Run::new(&self.run_id_base));

        let request_id = self
            .invocation_context
            .metadata()
            .get("request_id")
            .cloned()
            .unwrap_or_default();
        debug!(agent = %self.full_name, request_id = %request_id, "invoking agent chain");

        let max_execution_seconds = self
            .agent_spec
            .max_execution_seconds
            .unwrap_or(DEFAULT_MAX_EXECUTION_SECONDS);

        let output = match tokio::time::timeout(
            Duration::from_secs(max_execution_seconds),
            self.drive_chain(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(AgentError::Cancelled)) => return Err(AgentError::Cancelled),
            Ok(Err(e)) => format!("Agent stopped due to exception {e}"),
            Err(_) => format!(
                "Agent stopped due to exception: timed out after {max_execution_seconds} seconds"
            ),
        };

        let output = self.error_detector.handle_error(output);
        self.journal.write(&AgentMessage::ai(&output)).await;
        *self.last_run.lock().await = Some(Run::new(&self.run_id_base).into_terminal());
        Ok(output)
    }

    /// The tool-calling loop of one turn.
    async fn drive_chain(&self) -> Result<String, AgentError> {
        let max_iterations = self
            .agent_spec
            .max_iterations
            .unwrap_or(DEFAULT_MAX_ITERATIONS);
        let recursion_limit = max_iterations * 2 + 1;

        let definitions: Vec<ToolDefinition> = self
            .tools
            .iter()
            .map(|tool| tool.resolved.definition.clone())
            .collect();

        let cancellation = self.invocation_context.cancellation();
        for _ in 0..recursion_limit {
            if cancellation.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            let transcript = self.build_transcript().await;
            let response = self.invoke_model_with_retries(&transcript, &definitions).await?;

            if response.tool_calls.is_empty() {
                return Ok(response.content);
            }

            // Fan out over the requested tools; results come back in request
            // order and are journaled at tool completion.
            let mut builds = Vec::new();
            for call in &response.tool_calls {
                let Some(tool) = self
                    .tools
                    .iter()
                    .find(|tool| tool.resolved.advertised == call.name)
                else {
                    warn!(agent = %self.full_name, tool = %call.name, "model requested unknown tool");
                    continue;
                };
                let arguments = call
                    .arguments
                    .as_object()
                    .cloned()
                    .unwrap_or_else(Map::new);
                let activation = Arc::clone(&tool.activation);
                builds.push(async move {
                    let name = activation.name().to_string();
                    let messages = activation.build(arguments).await;
                    (name, messages)
                });
            }

            for (name, result) in join_all(builds).await {
                let (messages, tool_origin) = match result {
                    Ok(result) => (result.messages, result.origin),
                    Err(AgentError::Cancelled) => return Err(AgentError::Cancelled),
                    Err(e) => (vec![AgentMessage::ai(format!("Error: {e}"))], Vec::new()),
                };
                if let Some(tool_message) = parse_tool_output(&messages, tool_origin) {
                    self.journal.write(&tool_message).await;
                } else {
                    debug!(agent = %self.full_name, tool = %name, "tool produced no answer");
                }
            }
        }

        Ok("Agent stopped due to iteration limit or time limit.".to_string())
    }

    /// System prompt: instructions, argument assignments, then the command.
    fn build_system_prompt(&self, arguments: &Map<String, Value>) -> String {
        let mut prompt = self.agent_spec.instructions.clone().unwrap_or_default();

        let assigner = ArgumentAssigner::new(self.agent_spec.function_properties().cloned());
        let clauses = assigner.assign(arguments);
        if !clauses.is_empty() {
            prompt.push('\n');
            prompt.push_str(&clauses.join(" "));
        }
        if let Some(command) = &self.agent_spec.command {
            prompt.push('\n');
            prompt.push_str(command);
        }
        prompt
    }

    /// The chat history as a model transcript, skipping framework chatter.
    async fn build_transcript(&self) -> Vec<ChatRecord> {
        let history = self.chat_history.lock().await;
        history
            .iter()
            .filter_map(|message| {
                message
                    .chat_role()
                    .map(|role| ChatRecord::new(role, message.text()))
            })
            .collect()
    }

    /// Invokes the primary model with retries, then each fallback in order.
    async fn invoke_model_with_retries(
        &self,
        transcript: &[ChatRecord],
        definitions: &[ToolDefinition],
    ) -> Result<ModelResponse, AgentError> {
        let resources = self.llm_resources.lock().await;
        if resources.is_empty() {
            return Err(AgentError::Internal(format!(
                "create_resources was not called for {}",
                self.full_name
            )));
        }

        let mut last_error = AgentError::Provider("no model invocation attempted".to_string());
        for llm in resources.iter() {
            let model = llm.model();
            let mut retries = MODEL_RETRIES;
            while retries > 0 {
                match model.invoke(transcript, definitions).await {
                    Ok(response) => {
                        if let Some(usage) = &response.usage {
                            self.invocation_context.token_counter().add(usage);
                        }
                        return Ok(response);
                    }
                    Err(AgentError::Provider(message)) => {
                        if let Some(recovered) = recover_parse_error(&message) {
                            // The agent produced good output and the chain
                            // choked on the format; use what it said.
                            return Ok(ModelResponse {
                                content: recovered,
                                ..ModelResponse::default()
                            });
                        }
                        if let Some(advice) = check_for_api_key_exception(&message) {
                            return Err(AgentError::Provider(advice));
                        }
                        warn!(agent = %self.full_name, error = %message, "retrying model invocation");
                        retries -= 1;
                        last_error = AgentError::Provider(message);
                    }
                    Err(other) => return Err(other),
                }
            }
        }
        Err(last_error)
    }

    /// Full chat history, for response assembly and tool answers.
    pub async fn get_response(&self) -> Vec<AgentMessage> {
        self.chat_history.lock().await.clone()
    }

    /// This context's chat history as a chat-context entry, copied.
    pub async fn to_chat_history(&self) -> chat_event::ChatHistory {
        let history = self.chat_history.lock().await;
        chat_event::ChatHistory {
            origin: self.origin.clone(),
            messages: history
                .iter()
                .map(|message| crate::messages::convert::to_chat_message(message, &self.origin))
                .collect(),
        }
    }

    /// Releases model clients and child activations.
    pub async fn delete_resources(&self) {
        for llm in self.llm_resources.lock().await.iter_mut() {
            llm.delete_resources().await;
        }
        for tool in &self.tools {
            tool.activation.delete_resources().await;
        }
    }
}

/// Takes the last AI-shaped message as the tool's answer, wrapped as an
/// `AgentToolResult` preserving where it came from.
fn parse_tool_output(
    messages: &[AgentMessage],
    tool_origin: Vec<OriginEntry>,
) -> Option<AgentMessage> {
    let mut origin = tool_origin;
    let mut answer: Option<&str> = None;
    for message in messages {
        match message {
            AgentMessage::Ai { text } => answer = Some(text),
            AgentMessage::AgentToolResult {
                text,
                tool_result_origin,
            } => {
                answer = Some(text);
                origin = tool_result_origin.clone();
            }
            _ => {}
        }
    }
    answer.map(|text| AgentMessage::tool_result(text, origin))
}

/// Rehydrates a context's chat history from the entry whose origin matches.
fn rehydrate_history(chat_context: &ChatContext, full_name: &str) -> Vec<AgentMessage> {
    for history in &chat_context.chat_histories {
        if full_name_from_origin(&history.origin) != full_name {
            continue;
        }
        return history
            .messages
            .iter()
            .filter_map(crate::messages::convert::from_chat_message)
            .collect();
    }
    Vec::new()
}

/// Recovers the agent's real output from the documented parse-error wrapper.
fn recover_parse_error(message: &str) -> Option<String> {
    message
        .strip_prefix(PARSE_ERROR_PREFIX)
        .map(|rest| rest.strip_suffix('`').unwrap_or(rest).to_string())
}
