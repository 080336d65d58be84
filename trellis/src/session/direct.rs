//! Driving one streaming-chat turn against a locally hosted network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chat_event::{
    ChatContext, ChatFilterType, ChatMessageType, ChatRequest, ChatResponse, OriginEntry,
};
use futures::stream::BoxStream;
use futures_util::StreamExt;
use serde_json::{json, Map, Value};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};

use crate::coded::CodedToolRegistry;
use crate::error::AgentError;
use crate::graph::{ActivationFactory, SlyDataRedactor};
use crate::journal::ChannelJournal;
use crate::llm::LlmFactory;
use crate::messages::structure_parser::parse_structure;
use crate::messages::{convert, AgentMessage};
use crate::network::{NetworkProvider, NetworkStore};
use crate::run::{InvocationContext, RunContext};
use crate::toolbox::ToolboxRegistry;

use super::http::StandardSessionFactory;
use super::{AsyncAgentSession, AsyncAgentSessionFactory};

/// The shared dependencies every direct session draws on.
///
/// Built once at server start. The session factory inside refers back to
/// these deps (local `/name` references become direct sessions), so
/// construction goes through [`SessionDeps::new`] which ties the cycle.
pub struct SessionDeps {
    pub store: Arc<NetworkStore>,
    pub llm_factory: Arc<LlmFactory>,
    pub toolbox: Arc<ToolboxRegistry>,
    pub coded_tools: CodedToolRegistry,
    pub session_factory: std::sync::OnceLock<Arc<dyn AsyncAgentSessionFactory>>,
}

impl SessionDeps {
    pub fn new(
        store: Arc<NetworkStore>,
        llm_factory: Arc<LlmFactory>,
        toolbox: Arc<ToolboxRegistry>,
        coded_tools: CodedToolRegistry,
    ) -> Arc<Self> {
        let deps = Arc::new(Self {
            store,
            llm_factory,
            toolbox,
            coded_tools,
            session_factory: std::sync::OnceLock::new(),
        });
        let factory: Arc<dyn AsyncAgentSessionFactory> =
            Arc::new(StandardSessionFactory::new(Arc::downgrade(&deps)));
        let _ = deps.session_factory.set(factory);
        deps
    }

    pub fn session_factory(&self) -> Arc<dyn AsyncAgentSessionFactory> {
        self.session_factory
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::new(super::NoExternalSessions))
    }
}

/// One turn end-to-end against one named network.
pub struct DirectStreamingSession {
    deps: Arc<SessionDeps>,
    provider: NetworkProvider,
    metadata: HashMap<String, String>,
}

impl DirectStreamingSession {
    pub fn new(deps: Arc<SessionDeps>, provider: NetworkProvider) -> Self {
        Self {
            deps,
            provider,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[async_trait]
impl AsyncAgentSession for DirectStreamingSession {
    async fn streaming_chat(
        &self,
        request: ChatRequest,
    ) -> Result<BoxStream<'static, ChatResponse>, AgentError> {
        let network = self
            .provider
            .resolve()
            .ok_or_else(|| AgentError::UnknownNetwork(self.provider.name().to_string()))?;

        let (journal, receiver) = ChannelJournal::new();
        let invocation_context = Arc::new(InvocationContext::new(
            self.metadata.clone(),
            Arc::new(journal),
            Arc::clone(&self.deps.llm_factory),
            Arc::clone(&self.deps.toolbox),
            self.deps.coded_tools.clone(),
            self.deps.session_factory(),
            request.sly_data.clone().unwrap_or_default(),
        ));
        let factory = Arc::new(ActivationFactory::new(
            Arc::clone(&network),
            Arc::clone(&invocation_context),
            request.chat_context.clone(),
        ));

        let front_man = network.front_man().to_string();
        let front_spec = network
            .agent(&front_man)
            .cloned()
            .ok_or_else(|| AgentError::Internal(format!("front man {front_man} missing")))?;
        let user_text = request
            .user_message
            .as_ref()
            .map(|message| message.text.clone())
            .unwrap_or_default();
        let filter = request.filter_type();

        info!(network = %network.name(), front_man = %front_man, "starting streaming chat turn");
        let cancellation = invocation_context.cancellation();
        tokio::spawn(run_turn(
            front_spec,
            factory,
            invocation_context,
            user_text,
        ));

        // Dropping the stream cancels the turn: the guard lives inside the
        // stream's closure and fires the token when the consumer goes away.
        let guard = cancellation.drop_guard();
        let stream = UnboundedReceiverStream::new(receiver)
            .filter_map(move |(message, origin)| {
                let _held = &guard;
                let keep = keep_for_filter(filter, &message, &origin);
                async move {
                    keep.then(|| ChatResponse::new(convert::to_chat_message(&message, &origin)))
                }
            })
            .boxed();
        Ok(stream)
    }
}

/// Runs the front-man chain and emits the terminal framework message.
async fn run_turn(
    front_spec: crate::network::AgentSpec,
    factory: Arc<ActivationFactory>,
    invocation_context: Arc<InvocationContext>,
    user_text: String,
) {
    let front_allow = front_spec.allow.clone();
    let mut run_context = RunContext::new(front_spec, &[], Arc::clone(&factory));

    let result = match run_context.create_resources().await {
        Ok(()) => run_context.submit_message(&user_text, &Map::new()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(final_text) => {
            let origin = run_context.origin().to_vec();

            // Token accounting goes out as its own framework message just
            // ahead of the terminal one.
            let counter = invocation_context.token_counter();
            if counter.counted_anything() {
                let accounting = AgentMessage::AgentFramework {
                    text: String::new(),
                    structure: Some(counter.report()),
                    sly_data: None,
                    chat_context: None,
                };
                invocation_context
                    .journal()
                    .write_message(&accounting, &origin)
                    .await;
            }

            let terminal =
                build_terminal_message(&run_context, &invocation_context, front_allow, final_text)
                    .await;
            invocation_context
                .journal()
                .write_message(&terminal, &origin)
                .await;
        }
        Err(AgentError::Cancelled) => {
            debug!("turn cancelled; tearing down silently");
        }
        Err(e) => {
            // Unrecoverable before or during the chain: one terminal
            // framework event with a user-visible reason, no stack traces.
            let terminal = AgentMessage::AgentFramework {
                text: e.to_string(),
                structure: None,
                sly_data: None,
                chat_context: None,
            };
            let origin = run_context.origin().to_vec();
            invocation_context
                .journal()
                .write_message(&terminal, &origin)
                .await;
        }
    }

    run_context.delete_resources().await;
    invocation_context.close();
}

/// Assembles the terminal framework message: compiled text, extracted
/// structure, redacted sly data, and the chat context for the next turn.
async fn build_terminal_message(
    run_context: &RunContext,
    invocation_context: &Arc<InvocationContext>,
    front_allow: Option<Value>,
    final_text: String,
) -> AgentMessage {
    let parsed = parse_structure(&final_text);
    let (text, structure) = match parsed.structure {
        Some(structure) => (parsed.remainder.unwrap_or_default(), Some(structure)),
        None => (final_text, None),
    };

    let sly_data = {
        let shared = invocation_context.sly_data();
        let sly_data = shared.lock().await;
        let redactor = SlyDataRedactor::new(
            front_allow.map(|allow| json!({ "allow": allow })).as_ref(),
            &["allow.to_upstream.sly_data", "allow.sly_data"],
        );
        let redacted = redactor.filter_config(&sly_data);
        (!redacted.is_empty()).then_some(redacted)
    };

    let chat_context = ChatContext {
        chat_histories: vec![run_context.to_chat_history().await],
    };

    AgentMessage::AgentFramework {
        text,
        structure,
        sly_data,
        chat_context: Some(chat_context),
    }
}

/// The chat filter: MINIMAL keeps the front-man's answers and framework
/// messages; MAXIMAL keeps everything with its origin.
fn keep_for_filter(
    filter: ChatFilterType,
    message: &AgentMessage,
    origin: &[OriginEntry],
) -> bool {
    match filter {
        ChatFilterType::Maximal => true,
        ChatFilterType::Minimal => match message.kind() {
            ChatMessageType::AgentFramework => true,
            ChatMessageType::Ai => origin.len() <= 1,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_filter_keeps_front_man_answers_and_framework() {
        let front = vec![OriginEntry::new("front_man", 0)];
        let deep = vec![
            OriginEntry::new("front_man", 0),
            OriginEntry::new("helper", 0),
        ];
        assert!(keep_for_filter(
            ChatFilterType::Minimal,
            &AgentMessage::ai("answer"),
            &front
        ));
        assert!(!keep_for_filter(
            ChatFilterType::Minimal,
            &AgentMessage::ai("sub answer"),
            &deep
        ));
        assert!(!keep_for_filter(
            ChatFilterType::Minimal,
            &AgentMessage::human("hi"),
            &front
        ));
        assert!(keep_for_filter(
            ChatFilterType::Minimal,
            &AgentMessage::AgentFramework {
                text: "done".to_string(),
                structure: None,
                sly_data: None,
                chat_context: None,
            },
            &front
        ));
    }

    #[test]
    fn maximal_filter_keeps_everything() {
        let deep = vec![
            OriginEntry::new("front_man", 0),
            OriginEntry::new("helper", 0),
        ];
        assert!(keep_for_filter(
            ChatFilterType::Maximal,
            &AgentMessage::human("hi"),
            &deep
        ));
    }
}
