//! External URL/path references must be known.

use crate::network::{is_url_or_path, NetworkSpec};

use super::NetworkValidator;

/// Checks that every `/path` or `http(s)://` tool reference appears in the
/// configured allowed external-agent or MCP-server lists.
pub struct UrlValidator {
    allowed: Vec<String>,
}

impl UrlValidator {
    pub fn new(external_agents: Vec<String>, mcp_servers: Vec<String>) -> Self {
        let mut allowed = external_agents;
        allowed.extend(mcp_servers);
        Self { allowed }
    }
}

impl NetworkValidator for UrlValidator {
    fn validate(&self, spec: &NetworkSpec) -> Vec<String> {
        let mut errors = Vec::new();
        for agent in &spec.tools {
            for tool in &agent.tools {
                if is_url_or_path(tool) && !self.allowed.iter().any(|allowed| allowed == tool) {
                    errors.push(format!(
                        "Agent '{}' has invalid URL or path in tools: '{}'",
                        agent.name, tool
                    ));
                }
            }
        }
        errors
    }
}
