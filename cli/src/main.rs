//! Network-file validator CLI.
//!
//! Validates one agent-network file against the full rule suite.
//! Exit codes: 0 pass, 1 validation errors, 2 I/O or parse errors.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use trellis::{CompositeValidator, NetworkSpec, ValidatorOptions};

#[derive(Parser, Debug)]
#[command(
    name = "trellis-validate",
    about = "Validate an agent network configuration file.",
    after_help = "Examples:\n  trellis-validate registries/hello_world.json\n  trellis-validate my_agent.json --verbose"
)]
struct Args {
    /// Path to the network file to validate.
    network_file: String,

    /// Print additional information about the agent network.
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Permit cycles in the agent graph.
    #[arg(long, default_value_t = false)]
    include_cycles: bool,

    /// Comma-separated list of valid external agent references
    /// (e.g. '/agent1,/agent2').
    #[arg(long)]
    external_agents: Option<String>,

    /// Comma-separated list of valid MCP server URLs.
    #[arg(long)]
    mcp_servers: Option<String>,

    /// Output validation results as JSON.
    #[arg(long, default_value_t = false)]
    json_output: bool,

    /// Base directory for resolving a relative network-file path.
    #[arg(long)]
    registry_dir: Option<String>,
}

fn main() -> ExitCode {
    let _ = env_config::load_and_apply("trellis", None);
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let path = match &args.registry_dir {
        Some(dir) if !Path::new(&args.network_file).is_absolute() => {
            Path::new(dir).join(&args.network_file)
        }
        _ => Path::new(&args.network_file).to_path_buf(),
    };

    let body = match std::fs::read_to_string(&path) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error: File not found - {}: {e}", path.display());
            return ExitCode::from(2);
        }
    };

    let spec = match NetworkSpec::parse(&body) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Error: Failed to parse network file - {e}");
            return ExitCode::from(2);
        }
    };

    let options = ValidatorOptions {
        include_cycles: args.include_cycles,
        external_agents: split_csv(args.external_agents.as_deref()),
        mcp_servers: split_csv(args.mcp_servers.as_deref()),
    };
    let errors = CompositeValidator::new(options).validate(&spec);

    if args.json_output {
        let report = json!({
            "file": path.display().to_string(),
            "passed": errors.is_empty(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
        return if errors.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        };
    }

    if !errors.is_empty() {
        println!("Validation failed with {} error(s):\n", errors.len());
        for (index, error) in errors.iter().enumerate() {
            println!("  {}. {error}", index + 1);
        }
        return ExitCode::from(1);
    }

    println!("Validation passed: No errors found.");
    if args.verbose {
        print_network_summary(&spec);
    }
    ExitCode::SUCCESS
}

fn split_csv(csv: Option<&str>) -> Vec<String> {
    csv.map(|csv| {
        csv.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn print_network_summary(spec: &NetworkSpec) {
    println!("\n--- Agent Network Summary ---");
    println!("Total agents/tools defined: {}", spec.tools.len());

    if !spec.tools.is_empty() {
        println!("\nAgents:");
        for agent in &spec.tools {
            let kind = match agent.kind() {
                trellis::AgentKind::LlmAgent => "LLM Agent",
                trellis::AgentKind::CodedTool => "Coded Tool",
                trellis::AgentKind::Toolbox => "Toolbox Tool",
            };
            println!("  - {} ({kind})", agent.name);
            if !agent.tools.is_empty() {
                println!("      Sub-tools: {}", agent.tools.join(", "));
            }
        }
    }

    if let Some(metadata) = &spec.metadata {
        if !metadata.is_empty() {
            println!("\nMetadata keys: {}", metadata.len());
        }
    }
}
