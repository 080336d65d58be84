//! End-to-end turns against scripted models.

use std::collections::HashMap;
use std::sync::Arc;

use chat_event::{ChatFilter, ChatFilterType, ChatMessageType, ChatRequest, ChatResponse};
use futures_util::StreamExt;
use serde_json::{Map, Value};
use trellis::llm::{LlmClientFactory, NoopClientPolicy};
use trellis::{
    AgentError, AgentNetwork, AsyncAgentSession, CodedToolRegistry, CompositeValidator,
    DirectStreamingSession, LlmFactory, LlmResources, MockChatModel, ModelResponse, ModelToolCall,
    NetworkSpec, NetworkStore, SessionDeps, ToolboxRegistry, ValidatorOptions,
};

/// Llm class for tests: hands each agent the shared scripted model named by
/// its `model_name`.
struct ScriptedFactory {
    models: HashMap<String, Arc<MockChatModel>>,
}

impl LlmClientFactory for ScriptedFactory {
    fn create_llm_resources(&self, config: &Map<String, Value>) -> Result<LlmResources, AgentError> {
        let name = config
            .get("model_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let model = self
            .models
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::Provider(format!("no scripted model named '{name}'")))?;
        Ok(LlmResources::new(model, Box::new(NoopClientPolicy)))
    }
}

fn tool_call(name: &str, arguments: Value) -> ModelResponse {
    ModelResponse {
        content: String::new(),
        tool_calls: vec![ModelToolCall {
            id: format!("call-{name}"),
            name: name.to_string(),
            arguments,
        }],
        usage: None,
    }
}

fn answer(content: &str) -> ModelResponse {
    ModelResponse {
        content: content.to_string(),
        ..ModelResponse::default()
    }
}

fn build_deps(
    network_json: &str,
    network_name: &str,
    options: ValidatorOptions,
    models: HashMap<String, Arc<MockChatModel>>,
) -> Arc<SessionDeps> {
    let spec = NetworkSpec::parse(network_json).expect("network parses");
    let validator = CompositeValidator::new(options);
    let network = AgentNetwork::from_spec(network_name, spec, &validator).expect("network valid");

    let store = Arc::new(NetworkStore::new());
    store.install(network_name, Arc::new(network));

    let mut llm_factory = LlmFactory::standard();
    llm_factory.register("scripted", Arc::new(ScriptedFactory { models }));

    SessionDeps::new(
        store,
        Arc::new(llm_factory),
        Arc::new(ToolboxRegistry::standard(None).expect("toolbox")),
        CodedToolRegistry::new(),
    )
}

async fn collect(
    deps: &Arc<SessionDeps>,
    network_name: &str,
    request: ChatRequest,
) -> Vec<ChatResponse> {
    let provider = deps.store.get_provider(network_name.to_string());
    let session = DirectStreamingSession::new(Arc::clone(deps), provider);
    let stream = session.streaming_chat(request).await.expect("turn starts");
    stream.collect().await
}

const HELLO_WORLD: &str = r#"{
    "llm_config": {"class": "scripted"},
    "tools": [
        {
            "name": "announcer",
            "instructions": "Announce what the synonymizer found.",
            "llm_config": {"model_name": "announcer"},
            "tools": ["synonymizer"]
        },
        {
            "name": "synonymizer",
            "instructions": "Find a synonym for the given word.",
            "llm_config": {"model_name": "synonymizer"},
            "function": {
                "description": "Finds synonyms.",
                "parameters": {
                    "type": "object",
                    "properties": {"inquiry": {"type": "string"}},
                    "required": ["inquiry"]
                }
            }
        }
    ]
}"#;

fn hello_world_models() -> HashMap<String, Arc<MockChatModel>> {
    let mut models = HashMap::new();
    models.insert(
        "announcer".to_string(),
        Arc::new(MockChatModel::new(vec![
            tool_call("synonymizer", serde_json::json!({"inquiry": "hello"})),
            answer("A synonym for hello is salutation."),
        ])),
    );
    models.insert(
        "synonymizer".to_string(),
        Arc::new(MockChatModel::fixed("salutation")),
    );
    models
}

/// **Scenario**: one maximal turn over announcer → synonymizer. The stream
/// ends with exactly one terminal AGENT_FRAMEWORK message, every earlier
/// message's origin starts at the front man, and the synonymizer's answer
/// comes back as a tool result tagged with its origin.
#[tokio::test]
async fn hello_world_turn_streams_in_order() {
    let deps = build_deps(
        HELLO_WORLD,
        "hello_world",
        ValidatorOptions::default(),
        hello_world_models(),
    );
    let request = ChatRequest {
        chat_filter: Some(ChatFilter {
            chat_filter_type: ChatFilterType::Maximal,
        }),
        ..ChatRequest::from_text("hello")
    };
    let responses = collect(&deps, "hello_world", request).await;

    let terminal = responses.last().expect("stream not empty");
    assert_eq!(
        terminal.response.message_type,
        ChatMessageType::AgentFramework
    );
    assert_eq!(
        terminal.response.text.as_deref(),
        Some("A synonym for hello is salutation.")
    );
    assert!(terminal.response.chat_context.is_some());

    let framework_count = responses
        .iter()
        .filter(|r| r.response.message_type == ChatMessageType::AgentFramework)
        .count();
    assert_eq!(framework_count, 1);

    for response in &responses {
        let origin = response.response.origin.as_ref().expect("origin present");
        assert_eq!(origin[0].tool, "announcer");
    }

    let tool_result = responses
        .iter()
        .find(|r| r.response.message_type == ChatMessageType::AgentToolResult)
        .expect("tool result present");
    assert_eq!(tool_result.response.text.as_deref(), Some("salutation"));
    let tool_origin = tool_result
        .response
        .tool_result_origin
        .as_ref()
        .expect("tool result origin");
    assert_eq!(tool_origin.len(), 2);
    assert_eq!(tool_origin[1].tool, "synonymizer");
}

/// **Scenario**: the minimal filter strips the internal chatter down to the
/// front man's answer plus the terminal framework message.
#[tokio::test]
async fn minimal_filter_hides_internal_chatter() {
    let deps = build_deps(
        HELLO_WORLD,
        "hello_world",
        ValidatorOptions::default(),
        hello_world_models(),
    );
    let responses = collect(&deps, "hello_world", ChatRequest::from_text("hello")).await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].response.message_type, ChatMessageType::Ai);
    assert_eq!(
        responses[1].response.message_type,
        ChatMessageType::AgentFramework
    );
}

/// **Scenario**: submitting an empty follow-up with the returned chat
/// context reconstructs the first turn's chat history on a fresh session.
#[tokio::test]
async fn chat_context_round_trips() {
    let deps = build_deps(
        HELLO_WORLD,
        "hello_world",
        ValidatorOptions::default(),
        hello_world_models(),
    );
    let first = collect(&deps, "hello_world", ChatRequest::from_text("hello")).await;
    let first_context = first
        .last()
        .and_then(|r| r.response.chat_context.clone())
        .expect("first turn yields a chat context");
    let first_messages = first_context.chat_histories[0].messages.clone();

    let follow_up = ChatRequest {
        chat_context: Some(first_context),
        ..ChatRequest::from_text("")
    };
    let second = collect(&deps, "hello_world", follow_up).await;
    let second_context = second
        .last()
        .and_then(|r| r.response.chat_context.clone())
        .expect("second turn yields a chat context");
    let second_messages = &second_context.chat_histories[0].messages;

    // The second turn's history is the first turn's plus the empty human
    // message and the new answer.
    assert!(second_messages.len() > first_messages.len());
    assert_eq!(&second_messages[..first_messages.len()], &first_messages[..]);
}

/// **Scenario**: a configured-but-unreachable external agent yields exactly
/// one message saying it was unreachable, and the turn still completes.
#[tokio::test]
async fn unreachable_external_agent_reports_once() {
    let network = r#"{
        "llm_config": {"class": "scripted"},
        "tools": [
            {
                "name": "caller",
                "instructions": "Delegate everything.",
                "llm_config": {"model_name": "caller"},
                "tools": ["/offline"]
            }
        ]
    }"#;
    let mut models = HashMap::new();
    models.insert(
        "caller".to_string(),
        Arc::new(MockChatModel::new(vec![
            tool_call("offline", serde_json::json!({"inquiry": "anyone there?"})),
            answer("Could not reach the offline agent."),
        ])),
    );
    let deps = build_deps(
        network,
        "delegator",
        ValidatorOptions {
            external_agents: vec!["/offline".to_string()],
            ..ValidatorOptions::default()
        },
        models,
    );

    let request = ChatRequest {
        chat_filter: Some(ChatFilter {
            chat_filter_type: ChatFilterType::Maximal,
        }),
        ..ChatRequest::from_text("ping the offline agent")
    };
    let responses = collect(&deps, "delegator", request).await;

    let unreachable: Vec<_> = responses
        .iter()
        .filter(|r| {
            r.response
                .text
                .as_deref()
                .map(|text| {
                    text.contains("was unreachable. Cannot rely on results from it as a tool.")
                })
                .unwrap_or(false)
        })
        .collect();
    // One AI message from the external activation plus the tool-result echo
    // of the same answer in the caller's history.
    assert!(!unreachable.is_empty());
    let ai_unreachable: Vec<_> = unreachable
        .iter()
        .filter(|r| r.response.message_type == ChatMessageType::Ai)
        .collect();
    assert_eq!(ai_unreachable.len(), 1);

    let terminal = responses.last().expect("stream not empty");
    assert_eq!(
        terminal.response.message_type,
        ChatMessageType::AgentFramework
    );
}

/// **Scenario**: an unknown network errs before any stream is produced.
#[tokio::test]
async fn unknown_network_is_an_error() {
    let deps = build_deps(
        HELLO_WORLD,
        "hello_world",
        ValidatorOptions::default(),
        hello_world_models(),
    );
    let provider = deps.store.get_provider("nonexistent".to_string());
    let session = DirectStreamingSession::new(Arc::clone(&deps), provider);
    let err = session
        .streaming_chat(ChatRequest::from_text("hi"))
        .await
        .err()
        .expect("should fail");
    assert!(matches!(err, AgentError::UnknownNetwork(_)));
}
