//! Tool-name character-class checks.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::network::{is_url_or_path, NetworkSpec};

use super::NetworkValidator;

static TOOL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_/.\-]*$").unwrap_or_else(|e| panic!("{e}")));

/// Flags agent names and non-URL tool references outside the permitted
/// character class (letters, digits, `_`, `/`, `.`, `-`; must not start
/// with a digit or punctuation).
pub struct ToolNameValidator {
    _private: (),
}

impl ToolNameValidator {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for ToolNameValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkValidator for ToolNameValidator {
    fn validate(&self, spec: &NetworkSpec) -> Vec<String> {
        let mut errors = Vec::new();
        for agent in &spec.tools {
            if !TOOL_NAME.is_match(&agent.name) {
                errors.push(format!("Invalid tool name: '{}'", agent.name));
            }
            for tool in &agent.tools {
                if is_url_or_path(tool) {
                    continue;
                }
                if !TOOL_NAME.is_match(tool) {
                    errors.push(format!(
                        "Agent '{}' has invalid tool name in tools: '{}'",
                        agent.name, tool
                    ));
                }
            }
        }
        errors
    }
}
