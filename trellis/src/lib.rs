//! # Trellis
//!
//! A multi-agent orchestration runtime. A server process loads declarative
//! **agent network** files, validates them, and executes the resulting graph
//! of cooperating LLM agents, coded tools, toolbox tools, and external
//! agents on behalf of streaming chat requests.
//!
//! ## Main modules
//!
//! - [`network`]: the parsed [`NetworkSpec`], the immutable [`AgentNetwork`],
//!   the hot-reloadable [`NetworkStore`] with [`NetworkProvider`] indirection,
//!   and the manifest/file restorers.
//! - [`validation`]: the composite rule suite a network must pass at load.
//! - [`llm`]: the [`ChatModel`] seam, the provider registry ([`LlmFactory`]),
//!   client-lifecycle policies, and token accounting.
//! - [`toolbox`]: named reusable tools declared in YAML, including
//!   MCP-sourced tools behind [`McpToolProvider`].
//! - [`coded`]: code-backed tools resolved by symbolic reference.
//! - [`journal`]: origin-tagged message sinks ([`OriginatingJournal`],
//!   [`InterceptingJournal`]) and instantiation-index bookkeeping.
//! - [`run`]: [`RunContext`] (one agent invocation) and
//!   [`InvocationContext`] (one request).
//! - [`graph`]: [`CallableActivation`] variants and the
//!   [`SlyDataRedactor`] applied at trust boundaries.
//! - [`session`]: [`DirectStreamingSession`] driving one turn end-to-end,
//!   plus HTTP sessions for external agents.
//! - [`authorization`]: the [`Authorizer`] seam and the per-request policy.
//! - [`watcher`]: polling manifest observer and the periodic store updater.
//!
//! Wire shapes live in the separate `chat-event` crate; env/config loading in
//! `config`.

pub mod authorization;
pub mod coded;
pub mod error;
pub mod graph;
pub mod journal;
pub mod llm;
pub mod messages;
pub mod network;
pub mod run;
pub mod session;
pub mod toolbox;
pub mod validation;
pub mod watcher;

pub use authorization::{
    AgentAuthorizationPolicy, Authorizer, AuthorizerFactory, Entity, NullAuthorizer,
};
pub use coded::{search_prefixes, CodedTool, CodedToolRegistry};
pub use error::{AgentError, ConfigError, ValidationError};
pub use graph::{
    ActivationFactory, CallableActivation, ExternalActivation, LlmAgentActivation, ResolvedTool,
    SlyDataRedactor, ToolTarget, ToolboxActivation,
};
pub use journal::{
    ChannelJournal, InterceptingJournal, Journal, NullJournal, OriginatingJournal, Origination,
};
pub use llm::{
    check_for_api_key_exception, resolve_llm_config, value_or_env, AnthropicChat, ChatModel,
    ChatRecord, LlmFactory, LlmResources, MockChatModel, ModelResponse, ModelToolCall, ModelUsage,
    OpenAiChat, TokenCounter, ToolDefinition,
};
pub use messages::structure_parser::{parse_structure, ParsedStructure};
pub use messages::{processor::MessageProcessor, AgentMessage, ChatRole};
pub use network::{
    apply_replacement_values, is_url_or_path, report_network_connectivity, AgentKind, AgentNetwork,
    AgentSpec, ConnectivityInfo, ManifestRestorer, NetworkProvider, NetworkRestorer, NetworkSpec,
    NetworkStore, StoreEvent,
};
pub use run::{ArgumentAssigner, ErrorDetector, InvocationContext, Run, RunContext};
pub use session::{
    AsyncAgentSession, AsyncAgentSessionFactory, DirectStreamingSession, HttpAgentSession,
    SessionDeps, StandardSessionFactory,
};
pub use toolbox::{
    McpToolInfo, McpToolProvider, McpToolkit, Tool, ToolboxRegistry, Toolkit, LANGCHAIN_TOOL_TAG,
};
pub use validation::{CompositeValidator, NetworkValidator, ValidatorOptions};
pub use watcher::{ManifestWatcher, ObservedEvents, PollingObserver, RegistryObserver};

/// When running `cargo test -p trellis`, initializes tracing from `RUST_LOG`
/// so unit tests in `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
