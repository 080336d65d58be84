//! Cycle detection over the agent graph.

use std::collections::{HashMap, HashSet};

use crate::network::NetworkSpec;

use super::NetworkValidator;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Finds agents that are part of cyclical dependencies with a tri-color DFS.
/// A back edge collects every vertex on the current stack from the first
/// occurrence of the target onward into the cycle set.
pub struct CyclesValidator;

impl NetworkValidator for CyclesValidator {
    fn validate(&self, spec: &NetworkSpec) -> Vec<String> {
        let cyclical = find_cyclical_agents(spec);
        if cyclical.is_empty() {
            return Vec::new();
        }
        let mut sorted: Vec<&str> = cyclical.into_iter().collect();
        sorted.sort_unstable();
        vec![format!(
            "Cyclical dependencies found in agents: {:?}",
            sorted
        )]
    }
}

/// The set of agents on at least one cycle. Exposed for the CLI's report.
pub fn find_cyclical_agents(spec: &NetworkSpec) -> HashSet<&str> {
    let mut state: HashMap<&str, Color> = spec
        .agent_names()
        .map(|name| (name, Color::Unvisited))
        .collect();
    let mut cyclical: HashSet<&str> = HashSet::new();

    // The graph may have disconnected parts; start a DFS from every
    // still-unvisited agent.
    let names: Vec<&str> = spec.agent_names().collect();
    for name in names {
        if state[name] == Color::Unvisited {
            let mut path = Vec::new();
            dfs(spec, name, &mut path, &mut state, &mut cyclical);
        }
    }
    cyclical
}

fn dfs<'a>(
    spec: &'a NetworkSpec,
    agent: &'a str,
    path: &mut Vec<&'a str>,
    state: &mut HashMap<&'a str, Color>,
    cyclical: &mut HashSet<&'a str>,
) {
    match state[agent] {
        Color::InProgress => {
            // Back edge: everything from the first occurrence of `agent` on
            // the current path is part of the cycle.
            if let Some(start) = path.iter().position(|name| *name == agent) {
                cyclical.extend(path[start..].iter().copied());
                cyclical.insert(agent);
            }
            return;
        }
        Color::Done => return,
        Color::Unvisited => {}
    }

    state.insert(agent, Color::InProgress);
    path.push(agent);

    if let Some(node) = spec.agent(agent) {
        for child in &node.tools {
            if spec.agent(child).is_some() {
                dfs(spec, child.as_str(), path, state, cyclical);
            }
        }
    }

    path.pop();
    state.insert(agent, Color::Done);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: A→B, B→C, C→B has exactly {B, C} in its cycle set; A is
    /// not part of the cycle.
    #[test]
    fn simple_cycle_yields_its_exact_vertices() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "A", "instructions": "a", "tools": ["B"]},
                {"name": "B", "instructions": "b", "tools": ["C"]},
                {"name": "C", "instructions": "c", "tools": ["B"]}
            ]}"#,
        )
        .unwrap();
        let cyclical = find_cyclical_agents(&spec);
        let mut sorted: Vec<&str> = cyclical.into_iter().collect();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["B", "C"]);
    }

    #[test]
    fn acyclic_graph_has_no_errors() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "A", "instructions": "a", "tools": ["B", "C"]},
                {"name": "B", "instructions": "b", "tools": ["C"]},
                {"name": "C", "instructions": "c"}
            ]}"#,
        )
        .unwrap();
        assert!(CyclesValidator.validate(&spec).is_empty());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "A", "instructions": "a", "tools": ["A"]}
            ]}"#,
        )
        .unwrap();
        let cyclical = find_cyclical_agents(&spec);
        assert_eq!(cyclical.len(), 1);
        assert!(cyclical.contains("A"));
    }

    #[test]
    fn disconnected_components_are_all_checked() {
        let spec = NetworkSpec::parse(
            r#"{"tools": [
                {"name": "A", "instructions": "a", "tools": ["B"]},
                {"name": "B", "instructions": "b"},
                {"name": "X", "instructions": "x", "tools": ["Y"]},
                {"name": "Y", "instructions": "y", "tools": ["X"]}
            ]}"#,
        )
        .unwrap();
        let cyclical = find_cyclical_agents(&spec);
        let mut sorted: Vec<&str> = cyclical.into_iter().collect();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["X", "Y"]);
    }
}
