//! The trellis server binary.
//!
//! Loads env/config, restores the manifest into a network store, starts the
//! manifest watcher, and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trellis::{
    AgentAuthorizationPolicy, AuthorizerFactory, CodedToolRegistry, LlmFactory, ManifestRestorer,
    ManifestWatcher, NetworkStore, SessionDeps, ToolboxRegistry,
};

use serve::{run_serve, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "trellis-server", about = "Serve agent networks over streaming chat")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    address: String,

    /// Manifest file enumerating the hosted networks.
    /// Falls back to AGENT_MANIFEST_FILE.
    #[arg(long)]
    manifest: Option<String>,

    /// Manifest re-check period in seconds; 0 disables hot reload.
    #[arg(long, default_value_t = 30)]
    update_period_seconds: u64,

    /// Umbrella timeout for one chat request in seconds; 0 disables it.
    #[arg(long, default_value_t = 0)]
    chat_request_timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = env_config::load_and_apply("trellis", None);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let agent_env = env_config::AgentEnv::from_env();

    let store = Arc::new(NetworkStore::new());
    let restorer = ManifestRestorer::new(args.manifest.as_deref())?;
    let networks = restorer.restore()?;
    info!(count = networks.len(), "restored agent networks from manifest");
    store.replace_all(networks);

    let watcher_restorer = ManifestRestorer::new(args.manifest.as_deref())?;
    let watcher = ManifestWatcher::new(
        Arc::clone(&store),
        watcher_restorer,
        Duration::from_secs(args.update_period_seconds),
    );
    let _watcher_handle = watcher.start();

    let authorizer =
        AuthorizerFactory::standard().create_authorizer(agent_env.authorizer.as_deref());
    let policy = Arc::new(AgentAuthorizationPolicy::new(
        authorizer,
        Arc::clone(&store),
        &agent_env,
    ));

    let toolbox = Arc::new(ToolboxRegistry::standard(
        agent_env.toolbox_info_file.as_deref(),
    )?);
    let deps = SessionDeps::new(
        store,
        Arc::new(LlmFactory::standard()),
        toolbox,
        CodedToolRegistry::new(),
    );

    let state = Arc::new(AppState {
        deps,
        policy,
        agent_env,
        config: ServerConfig {
            chat_request_timeout: Duration::from_secs(args.chat_request_timeout_seconds),
        },
    });

    run_serve(Some(&args.address), state).await
}
