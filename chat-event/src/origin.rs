//! Origin entries: the path from the front-man to the executing activation.
//!
//! Two origins are considered the same iff their full-name serialization is
//! equal, so equality-sensitive code should compare via [`full_name_from_origin`].

use serde::{Deserialize, Serialize};

/// One hop in an origin path: the tool name plus an instantiation index that
/// disambiguates the k-th concurrent instance of the same tool on the same
/// parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginEntry {
    /// The string name of the tool in the network spec.
    pub tool: String,
    /// Which incarnation of the tool this is. First instance is 0.
    #[serde(default)]
    pub instantiation_index: u32,
}

impl OriginEntry {
    pub fn new(tool: impl Into<String>, instantiation_index: u32) -> Self {
        Self {
            tool: tool.into(),
            instantiation_index,
        }
    }
}

/// Renders an origin path as a dotted full name, e.g. `searcher.fetcher-2.parser`.
///
/// Index 0 is the common case and is left off; any later incarnation gets a
/// `-<index>` suffix on its component. An empty origin renders as `""`.
pub fn full_name_from_origin(origin: &[OriginEntry]) -> String {
    let mut components: Vec<String> = Vec::with_capacity(origin.len());
    for entry in origin {
        if entry.instantiation_index == 0 {
            components.push(entry.tool.clone());
        } else {
            components.push(format!("{}-{}", entry.tool, entry.instantiation_index));
        }
    }
    components.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_omits_zero_index() {
        let origin = vec![
            OriginEntry::new("front_man", 0),
            OriginEntry::new("helper", 0),
        ];
        assert_eq!(full_name_from_origin(&origin), "front_man.helper");
    }

    #[test]
    fn full_name_disambiguates_later_instances() {
        let origin = vec![
            OriginEntry::new("front_man", 0),
            OriginEntry::new("helper", 2),
        ];
        assert_eq!(full_name_from_origin(&origin), "front_man.helper-2");
    }

    #[test]
    fn empty_origin_renders_empty() {
        assert_eq!(full_name_from_origin(&[]), "");
    }

    /// **Scenario**: origins from a serialized chat context compare equal to
    /// freshly built ones via their full name even if index defaulting differed.
    #[test]
    fn deserialized_origin_matches_by_full_name() {
        let parsed: Vec<OriginEntry> =
            serde_json::from_str(r#"[{"tool": "front_man"}, {"tool": "helper", "instantiation_index": 1}]"#)
                .unwrap();
        let built = vec![
            OriginEntry::new("front_man", 0),
            OriginEntry::new("helper", 1),
        ];
        assert_eq!(full_name_from_origin(&parsed), full_name_from_origin(&built));
    }
}
