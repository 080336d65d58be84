//! Required-keyword checks.

use tracing::debug;

use crate::network::NetworkSpec;

use super::NetworkValidator;

/// Flags agents whose `instructions` field is present but empty. A missing
/// `instructions` is fine (that makes a coded-tool or toolbox agent); an
/// empty string is always a mistake.
pub struct KeywordValidator;

impl NetworkValidator for KeywordValidator {
    fn validate(&self, spec: &NetworkSpec) -> Vec<String> {
        debug!("validating agent network keywords");
        let mut errors = Vec::new();
        for agent in &spec.tools {
            if agent.instructions.as_deref() == Some("") {
                errors.push(format!("{} 'instructions' cannot be empty.", agent.name));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_instructions_fail() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [{"name": "mute", "instructions": ""}]}"#,
        )
        .unwrap();
        let errors = KeywordValidator.validate(&spec);
        assert_eq!(errors, vec!["mute 'instructions' cannot be empty.".to_string()]);
    }

    #[test]
    fn missing_instructions_are_fine() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [{"name": "toolbox_tool"}]}"#,
        )
        .unwrap();
        assert!(KeywordValidator.validate(&spec).is_empty());
    }
}
