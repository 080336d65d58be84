//! Front-man uniqueness and reachability from it.

use std::collections::HashSet;

use crate::network::{is_url_or_path, NetworkSpec};

use super::NetworkValidator;

/// Asserts that exactly one front-man exists (an agent with downstream
/// references that no other agent references) and that every declared agent
/// is reachable from it.
pub struct UnreachableNodesValidator;

impl NetworkValidator for UnreachableNodesValidator {
    fn validate(&self, spec: &NetworkSpec) -> Vec<String> {
        let mut errors = Vec::new();
        let candidates = spec.front_man_candidates();

        match candidates.len() {
            0 => errors.push("No top agent found in network".to_string()),
            1 => {
                let unreachable = find_unreachable(spec, candidates[0]);
                if !unreachable.is_empty() {
                    let mut sorted: Vec<&str> = unreachable.into_iter().collect();
                    sorted.sort_unstable();
                    errors.push(format!("Unreachable agents found: {:?}", sorted));
                }
            }
            _ => {
                let mut sorted = candidates.clone();
                sorted.sort_unstable();
                errors.push(format!(
                    "Multiple top agents found: {:?}. Expected exactly one.",
                    sorted
                ));
            }
        }
        errors
    }
}

/// All declared agents minus those reachable from `top_agent`.
fn find_unreachable<'a>(spec: &'a NetworkSpec, top_agent: &'a str) -> HashSet<&'a str> {
    let mut reachable: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![top_agent];
    while let Some(name) = stack.pop() {
        if !reachable.insert(name) {
            continue;
        }
        let Some(agent) = spec.agent(name) else {
            continue;
        };
        for tool in &agent.tools {
            if !is_url_or_path(tool) && spec.agent(tool).is_some() {
                stack.push(tool.as_str());
            }
        }
    }
    spec.agent_names()
        .filter(|name| !reachable.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_agent_is_reported() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "front", "instructions": "x", "tools": ["used"]},
                {"name": "used", "instructions": "x"},
                {"name": "orphan", "instructions": "x"}
            ]}"#,
        )
        .unwrap();
        let errors = UnreachableNodesValidator.validate(&spec);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("orphan"));
        assert!(!errors[0].contains("used"));
    }

    #[test]
    fn no_front_man_is_an_error() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "a", "instructions": "x", "tools": ["b"]},
                {"name": "b", "instructions": "x", "tools": ["a"]}
            ]}"#,
        )
        .unwrap();
        let errors = UnreachableNodesValidator.validate(&spec);
        assert_eq!(errors, vec!["No top agent found in network".to_string()]);
    }

    #[test]
    fn multiple_front_men_are_an_error() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "left", "instructions": "x", "tools": ["shared"]},
                {"name": "right", "instructions": "x", "tools": ["shared"]},
                {"name": "shared", "instructions": "x"}
            ]}"#,
        )
        .unwrap();
        let errors = UnreachableNodesValidator.validate(&spec);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("left"));
        assert!(errors[0].contains("right"));
        assert!(errors[0].contains("Expected exactly one"));
    }
}
