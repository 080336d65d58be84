//! Pulls a single JSON block out of model response text.
//!
//! Recognizes, in order of preference, a ```` ```json ```` fenced block, an
//! anonymous ```` ``` ```` fenced block, and a bare `{ … }` span. The parsed
//! value becomes the response `structure`; the surrounding prose (with the
//! block removed and blank runs collapsed) becomes the remainder text.
//! Malformed JSON yields no structure and leaves the text untouched.

use serde_json::Value;

/// Result of scanning response text for a JSON block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedStructure {
    /// The parsed JSON block, when one was found and parsed cleanly.
    pub structure: Option<Value>,
    /// The prose around the block, trimmed, segments joined by a blank line.
    /// `None` when no structure was found.
    pub remainder: Option<String>,
}

/// Scans `text` for one JSON block.
pub fn parse_structure(text: &str) -> ParsedStructure {
    let candidate = find_fenced(text, "```json")
        .or_else(|| find_fenced(text, "```"))
        .or_else(|| find_bare_object(text));

    let Some((start, end, json_text)) = candidate else {
        return ParsedStructure::default();
    };

    let Ok(structure) = serde_json::from_str::<Value>(json_text.trim()) else {
        return ParsedStructure::default();
    };

    let before = text[..start].trim();
    let after = text[end..].trim();
    let remainder = match (before.is_empty(), after.is_empty()) {
        (true, true) => String::new(),
        (false, true) => before.to_string(),
        (true, false) => after.to_string(),
        (false, false) => format!("{}\n\n{}", before, after),
    };

    ParsedStructure {
        structure: Some(structure),
        remainder: Some(remainder),
    }
}

/// Finds a fenced block opened by `fence` and closed by ```` ``` ````.
/// Returns (start-of-fence, end-after-fence, inner text).
fn find_fenced<'a>(text: &'a str, fence: &str) -> Option<(usize, usize, &'a str)> {
    let open = text.find(fence)?;
    let inner_start = open + fence.len();
    let close_rel = text[inner_start..].find("```")?;
    let inner_end = inner_start + close_rel;
    let end = inner_end + "```".len();
    Some((open, end, &text[inner_start..inner_end]))
}

/// Finds a bare object span: first `{` through the last `}`.
fn find_bare_object(text: &str) -> Option<(usize, usize, &str)> {
    let start = text.find('{')?;
    let end = text.rfind('}')? + 1;
    if end <= start {
        return None;
    }
    Some((start, end, &text[start..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_structure() {
        let parsed = parse_structure("This has no structure in it");
        assert_eq!(parsed.structure, None);
        assert_eq!(parsed.remainder, None);
    }

    #[test]
    fn json_fence_with_front_remainder() {
        let text = "\nThis has minimal structure in it.\n```json\n{\n    \"key\": \"value\"\n}\n```\n";
        let parsed = parse_structure(text);
        assert_eq!(parsed.structure, Some(json!({"key": "value"})));
        assert_eq!(
            parsed.remainder.as_deref(),
            Some("This has minimal structure in it.")
        );
    }

    #[test]
    fn anonymous_fence() {
        let text = "\n```\n{\n    \"key\": \"value\"\n}\n```\nThis has minimal structure in it.\n";
        let parsed = parse_structure(text);
        assert_eq!(parsed.structure, Some(json!({"key": "value"})));
        assert_eq!(
            parsed.remainder.as_deref(),
            Some("This has minimal structure in it.")
        );
    }

    #[test]
    fn bare_object_with_both_remainders() {
        let text = "\nHere is some JSON:\n{\n    \"key\": \"value\"\n}\nThis has minimal structure in it.\n";
        let parsed = parse_structure(text);
        assert_eq!(parsed.structure, Some(json!({"key": "value"})));
        assert_eq!(
            parsed.remainder.as_deref(),
            Some("Here is some JSON:\n\nThis has minimal structure in it.")
        );
    }

    #[test]
    fn nested_object_no_remainder() {
        let text = "\n```json\n{\n  \"key_1\": \"value_1\",\n  \"key_2\": {\n    \"key_3\": \"value_3\"\n  }\n}\n```\n";
        let parsed = parse_structure(text);
        assert_eq!(
            parsed.structure,
            Some(json!({"key_1": "value_1", "key_2": {"key_3": "value_3"}}))
        );
        assert_eq!(parsed.remainder.as_deref(), Some(""));
    }

    /// **Scenario**: "Result:" prose ahead of a
    /// fenced block becomes the text, the block becomes the structure.
    #[test]
    fn seed_case() {
        let parsed = parse_structure("Result:\n```json\n{\"k\":\"v\"}\n```");
        assert_eq!(parsed.structure, Some(json!({"k": "v"})));
        assert_eq!(parsed.remainder.as_deref(), Some("Result:"));
    }

    #[test]
    fn malformed_json_yields_no_structure() {
        let parsed = parse_structure("Almost: {not json]");
        assert_eq!(parsed.structure, None);
        assert_eq!(parsed.remainder, None);
    }
}
