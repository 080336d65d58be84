//! Connectivity reporting: what a network looks like from the outside.

use std::collections::HashSet;

use serde::Serialize;

use super::network::AgentNetwork;
use super::spec::{is_url_or_path, AgentKind};

/// One agent's connectivity entry.
#[derive(Clone, Debug, Serialize)]
pub struct ConnectivityInfo {
    /// The agent's name; the head entry is always the front-man.
    pub origin: String,
    /// Its downstream references, in declaration order.
    pub tools: Vec<String>,
    /// How a client should render the node.
    pub display_as: String,
}

/// Breadth-first connectivity report starting at the front-man.
///
/// One entry per reachable agent; external URL references appear in `tools`
/// but produce no entry of their own.
pub fn report_network_connectivity(network: &AgentNetwork) -> Vec<ConnectivityInfo> {
    let mut report = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: Vec<String> = vec![network.front_man().to_string()];

    while !queue.is_empty() {
        let mut next_queue = Vec::new();
        for name in queue {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(spec) = network.agent(&name) else {
                continue;
            };
            report.push(ConnectivityInfo {
                origin: name,
                tools: spec.tools.clone(),
                display_as: display_as(spec.kind()).to_string(),
            });
            for tool in &spec.tools {
                if !is_url_or_path(tool) {
                    next_queue.push(tool.clone());
                }
            }
        }
        queue = next_queue;
    }
    report
}

fn display_as(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::LlmAgent => "llm_agent",
        AgentKind::CodedTool => "coded_tool",
        AgentKind::Toolbox => "toolbox",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkSpec;
    use crate::validation::{CompositeValidator, ValidatorOptions};

    fn hello_world() -> AgentNetwork {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "announcer", "instructions": "Announce.", "tools": ["synonymizer"]},
                {"name": "synonymizer", "instructions": "Find synonyms."}
            ]}"#,
        )
        .unwrap();
        let validator = CompositeValidator::new(ValidatorOptions::default());
        AgentNetwork::from_spec("hello_world", spec, &validator).unwrap()
    }

    /// **Scenario**: the hello-world network reports two entries; the
    /// front-man lists its single tool and the leaf lists none.
    #[test]
    fn hello_world_connectivity() {
        let report = report_network_connectivity(&hello_world());
        assert_eq!(report.len(), 2);

        assert_eq!(report[0].origin, "announcer");
        assert_eq!(report[0].display_as, "llm_agent");
        assert_eq!(report[0].tools, vec!["synonymizer".to_string()]);

        assert_eq!(report[1].origin, "synonymizer");
        assert_eq!(report[1].display_as, "llm_agent");
        assert!(report[1].tools.is_empty());
    }
}
