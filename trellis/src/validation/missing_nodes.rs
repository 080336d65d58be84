//! Every non-URL tool reference must resolve to a declared agent.

use crate::network::{is_url_or_path, NetworkSpec};

use super::NetworkValidator;

/// Aggregates, per agent, the references in its `tools` list that name no
/// declared agent. URL/path references are someone else's problem.
pub struct MissingNodesValidator;

impl NetworkValidator for MissingNodesValidator {
    fn validate(&self, spec: &NetworkSpec) -> Vec<String> {
        let mut errors = Vec::new();
        for agent in &spec.tools {
            let missing: Vec<&str> = agent
                .tools
                .iter()
                .filter(|tool| !is_url_or_path(tool))
                .filter(|tool| spec.agent(tool).is_none())
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                let tools_str = missing
                    .iter()
                    .map(|tool| format!("'{}'", tool))
                    .collect::<Vec<_>>()
                    .join(", ");
                errors.push(format!(
                    "Agent '{}' references non-existent agent(s) in tools: {}",
                    agent.name, tools_str
                ));
            }
        }
        errors
    }
}
