//! Detection of error-shaped agent output.

use serde_json::json;
use tracing::warn;

/// Fragments that always indicate a runtime-originated failure.
const SYSTEM_ERROR_FRAGMENTS: &[&str] = &["Agent stopped"];

/// Watches final agent output for error fragments: the built-in system set
/// plus whatever the agent spec declares (known refusal prefixes and the
/// like). A hit reformats the output into a distinguishable error response;
/// stack traces never pass through here.
pub struct ErrorDetector {
    full_name: String,
    agent_error_fragments: Vec<String>,
}

impl ErrorDetector {
    pub fn new(full_name: impl Into<String>, agent_error_fragments: Vec<String>) -> Self {
        Self {
            full_name: full_name.into(),
            agent_error_fragments,
        }
    }

    fn detect(&self, output: &str) -> bool {
        SYSTEM_ERROR_FRAGMENTS
            .iter()
            .any(|fragment| output.contains(fragment))
            || self
                .agent_error_fragments
                .iter()
                .any(|fragment| output.contains(fragment))
    }

    /// Passes clean output through; rewrites detected errors into an error
    /// response naming the agent that produced them.
    pub fn handle_error(&self, output: String) -> String {
        if !self.detect(&output) {
            return output;
        }
        warn!(agent = %self.full_name, "error detected in agent output");
        json!({
            "error": output,
            "tool": self.full_name,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_output_passes_through() {
        let detector = ErrorDetector::new("front_man", vec![]);
        assert_eq!(detector.handle_error("All good".to_string()), "All good");
    }

    #[test]
    fn system_fragment_is_reformatted() {
        let detector = ErrorDetector::new("front_man", vec![]);
        let output = detector.handle_error("Agent stopped due to exception".to_string());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["tool"], "front_man");
        assert!(value["error"].as_str().unwrap().contains("Agent stopped"));
    }

    #[test]
    fn agent_fragments_from_spec_are_honored() {
        let detector =
            ErrorDetector::new("front_man.helper", vec!["I cannot help with".to_string()]);
        let output = detector.handle_error("I cannot help with that request".to_string());
        assert!(output.contains("\"error\""));
    }
}
