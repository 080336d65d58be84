//! Per-request ambient state.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::coded::CodedToolRegistry;
use crate::journal::{Journal, Origination};
use crate::llm::{LlmFactory, TokenCounter};
use crate::session::AsyncAgentSessionFactory;
use crate::toolbox::ToolboxRegistry;

/// Everything ambient to one streaming-chat request: metadata, the factories
/// activations construct through, the origination counter, the root journal,
/// the shared sly-data channel, and the cancellation token that tears the
/// call tree down.
pub struct InvocationContext {
    metadata: HashMap<String, String>,
    origination: Origination,
    journal: Arc<dyn Journal>,
    llm_factory: Arc<LlmFactory>,
    toolbox: Arc<ToolboxRegistry>,
    coded_tools: CodedToolRegistry,
    session_factory: Arc<dyn AsyncAgentSessionFactory>,
    token_counter: Arc<TokenCounter>,
    sly_data: Arc<Mutex<Map<String, Value>>>,
    cancellation: CancellationToken,
}

impl InvocationContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        metadata: HashMap<String, String>,
        journal: Arc<dyn Journal>,
        llm_factory: Arc<LlmFactory>,
        toolbox: Arc<ToolboxRegistry>,
        coded_tools: CodedToolRegistry,
        session_factory: Arc<dyn AsyncAgentSessionFactory>,
        sly_data: Map<String, Value>,
    ) -> Self {
        Self {
            metadata,
            origination: Origination::new(),
            journal,
            llm_factory,
            toolbox,
            coded_tools,
            session_factory,
            token_counter: Arc::new(TokenCounter::new()),
            sly_data: Arc::new(Mutex::new(sly_data)),
            cancellation: CancellationToken::new(),
        }
    }

    /// Opaque request metadata. `request_id` and `user_id` get propagated to
    /// tracing; everything else is passthrough.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn origination(&self) -> &Origination {
        &self.origination
    }

    pub fn journal(&self) -> Arc<dyn Journal> {
        Arc::clone(&self.journal)
    }

    pub fn llm_factory(&self) -> Arc<LlmFactory> {
        Arc::clone(&self.llm_factory)
    }

    pub fn toolbox(&self) -> Arc<ToolboxRegistry> {
        Arc::clone(&self.toolbox)
    }

    pub fn coded_tools(&self) -> &CodedToolRegistry {
        &self.coded_tools
    }

    pub fn session_factory(&self) -> Arc<dyn AsyncAgentSessionFactory> {
        Arc::clone(&self.session_factory)
    }

    pub fn token_counter(&self) -> Arc<TokenCounter> {
        Arc::clone(&self.token_counter)
    }

    /// The request-wide sly-data channel shared by every activation.
    pub fn sly_data(&self) -> Arc<Mutex<Map<String, Value>>> {
        Arc::clone(&self.sly_data)
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Ends the request: pending sub-activations observe the cancelled token
    /// and release their resources cooperatively.
    pub fn close(&self) {
        self.cancellation.cancel();
    }
}
