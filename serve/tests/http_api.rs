//! HTTP surface tests against a server bound to an ephemeral port.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use trellis::llm::{LlmClientFactory, NoopClientPolicy};
use trellis::{
    AgentAuthorizationPolicy, AgentError, AgentNetwork, CodedToolRegistry, CompositeValidator,
    LlmFactory, LlmResources, MockChatModel, NetworkSpec, NetworkStore, NullAuthorizer,
    SessionDeps, ToolboxRegistry, ValidatorOptions,
};

use serve::{run_serve_on_listener, AppState, ServerConfig};

struct FixedFactory {
    model: Arc<MockChatModel>,
}

impl LlmClientFactory for FixedFactory {
    fn create_llm_resources(
        &self,
        _config: &Map<String, Value>,
    ) -> Result<LlmResources, AgentError> {
        Ok(LlmResources::new(
            Arc::clone(&self.model) as Arc<dyn trellis::ChatModel>,
            Box::new(NoopClientPolicy),
        ))
    }
}

async fn start_server() -> String {
    let spec = NetworkSpec::parse(
        r#"{
            "llm_config": {"class": "scripted"},
            "tools": [
                {"name": "greeter", "instructions": "Greet.", "tools": ["echo"]},
                {"name": "echo", "instructions": "Echo the input."}
            ]
        }"#,
    )
    .unwrap();
    let validator = CompositeValidator::new(ValidatorOptions::default());
    let network = AgentNetwork::from_spec("greeter_net", spec, &validator).unwrap();

    let store = Arc::new(NetworkStore::new());
    store.install("greeter_net", Arc::new(network));

    let mut llm_factory = LlmFactory::standard();
    llm_factory.register(
        "scripted",
        Arc::new(FixedFactory {
            model: Arc::new(MockChatModel::fixed("Hello from the greeter.")),
        }),
    );

    let deps = SessionDeps::new(
        Arc::clone(&store),
        Arc::new(llm_factory),
        Arc::new(ToolboxRegistry::standard(None).unwrap()),
        CodedToolRegistry::new(),
    );
    let agent_env = env_config::AgentEnv::from_env();
    let policy = Arc::new(AgentAuthorizationPolicy::new(
        Arc::new(NullAuthorizer),
        store,
        &agent_env,
    ));

    let state = Arc::new(AppState {
        deps,
        policy,
        agent_env,
        config: ServerConfig {
            chat_request_timeout: Duration::from_secs(30),
        },
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = run_serve_on_listener(listener, state).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn healthz_and_list_respond() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["networks"], 1);

    let list: Value = client
        .get(format!("{base}/api/v1/list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["agents"][0]["agent_name"], "greeter_net");
}

#[tokio::test]
async fn connectivity_reports_reachable_graph() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let report: Value = client
        .get(format!("{base}/api/v1/greeter_net/connectivity"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let info = report["connectivity_info"].as_array().unwrap();
    assert_eq!(info.len(), 2);
    assert_eq!(info[0]["origin"], "greeter");
    assert_eq!(info[0]["tools"][0], "echo");

    let missing = client
        .get(format!("{base}/api/v1/nonexistent/connectivity"))
        .send()
        .await
        .unwrap();
    // The null authorizer allows the request, but the network must exist.
    assert_eq!(missing.status(), 403);
}

#[tokio::test]
async fn streaming_chat_emits_json_lines_ending_in_framework() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let body: HashMap<&str, Value> = [(
        "user_message",
        serde_json::json!({"type": "HUMAN", "text": "hi"}),
    )]
    .into_iter()
    .collect();

    let response = client
        .post(format!("{base}/api/v1/greeter_net/streaming_chat"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json-lines")
    );

    let text = response.text().await.unwrap();
    let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    assert!(!lines.is_empty());

    let last: Value = serde_json::from_str(lines.last().unwrap()).unwrap();
    assert_eq!(last["response"]["type"], "AGENT_FRAMEWORK");
    assert_eq!(last["response"]["text"], "Hello from the greeter.");
    assert!(last["response"]["chat_context"].is_object());
}

#[tokio::test]
async fn unknown_agent_streaming_chat_is_not_authorized() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/nonexistent/streaming_chat"))
        .json(&serde_json::json!({"user_message": {"type": "HUMAN", "text": "hi"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}
