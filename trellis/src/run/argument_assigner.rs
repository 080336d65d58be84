//! Turns declared function arguments into prompt clauses.
//!
//! When an LLM agent has a parameter schema, the incoming arguments are
//! rendered as human-readable sentences appended to its instructions:
//! scalars become "The <k> is <v>.", arrays "The <k> are v1, v2.", objects
//! key/value pairs with the outer braces stripped. String-typed values are
//! single-quoted and any braces inside are doubled so they survive prompt
//! templating downstream.

use serde_json::{Map, Value};

/// Renders argument-assignment clauses for one parameter schema.
pub struct ArgumentAssigner {
    properties: Option<Map<String, Value>>,
}

impl ArgumentAssigner {
    /// `properties` is the `parameters.properties` object of the agent's
    /// function schema; `None` means render every argument untyped.
    pub fn new(properties: Option<Map<String, Value>>) -> Self {
        Self { properties }
    }

    /// One clause per argument. Null values are omitted; when a schema is
    /// present, arguments it does not declare are omitted too.
    pub fn assign(&self, arguments: &Map<String, Value>) -> Vec<String> {
        let mut clauses = Vec::new();
        for (name, value) in arguments {
            if value.is_null() {
                continue;
            }
            let value_type = match &self.properties {
                Some(properties) => {
                    let Some(property) = properties.get(name) else {
                        continue; // not a declared parameter
                    };
                    property.get("type").and_then(Value::as_str)
                }
                None => None,
            };
            let verb = if value_type == Some("array") { "are" } else { "is" };
            let rendered = Self::value_as_string(value, value_type);
            clauses.push(format!("The {name} {verb} {rendered}."));
        }
        clauses
    }

    /// Renders one argument value per its declared type.
    pub fn value_as_string(value: &Value, value_type: Option<&str>) -> String {
        match value_type {
            Some("string") => {
                let text = scalar_text(value);
                // gpt-series models trip over bare braces in prompt input.
                let escaped = text.replace('{', "{{").replace('}', "}}");
                format!("'{escaped}'")
            }
            Some("array") => flatten_array(value),
            Some("dict") | Some("object") => {
                let dumped = serde_json::to_string(value).unwrap_or_default();
                dumped
                    .trim_start_matches('{')
                    .trim_end_matches('}')
                    .to_string()
            }
            _ => scalar_text(value),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flattens nested arrays into a comma-joined item list.
fn flatten_array(value: &Value) -> String {
    fn collect(value: &Value, items: &mut Vec<String>) {
        match value {
            Value::Array(inner) => {
                for item in inner {
                    collect(item, items);
                }
            }
            other => items.push(scalar_text(other)),
        }
    }
    let mut items = Vec::new();
    collect(value, &mut items);
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assigner() -> ArgumentAssigner {
        let properties = json!({
            "name": {"type": "string"},
            "age": {"type": "int"},
            "scores": {"type": "array"},
            "metadata": {"type": "object"},
            "active": {"type": "boolean"}
        });
        ArgumentAssigner::new(properties.as_object().cloned())
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn string_arguments_are_quoted() {
        let clauses = assigner().assign(&args(json!({"name": "John Doe"})));
        assert_eq!(clauses, vec!["The name is 'John Doe'.".to_string()]);
    }

    #[test]
    fn integer_arguments_are_bare() {
        let clauses = assigner().assign(&args(json!({"age": 25})));
        assert_eq!(clauses, vec!["The age is 25.".to_string()]);
    }

    #[test]
    fn array_arguments_use_are() {
        let clauses = assigner().assign(&args(json!({"scores": [85, 92, 78]})));
        assert_eq!(clauses, vec!["The scores are 85, 92, 78.".to_string()]);
    }

    #[test]
    fn nested_arrays_flatten() {
        let rendered =
            ArgumentAssigner::value_as_string(&json!([["nested", "array"], "simple"]), Some("array"));
        assert_eq!(rendered, "nested, array, simple");
    }

    #[test]
    fn object_arguments_strip_outer_braces() {
        let rendered = ArgumentAssigner::value_as_string(
            &json!({"key": "value", "number": 42}),
            Some("dict"),
        );
        assert!(rendered.starts_with("\"key\""));
        assert!(rendered.ends_with("42"));
        assert!(!rendered.starts_with('{'));
        assert!(!rendered.ends_with('}'));
    }

    #[test]
    fn braces_in_strings_are_doubled() {
        let rendered =
            ArgumentAssigner::value_as_string(&json!("value with {braces}"), Some("string"));
        assert_eq!(rendered, "'value with {{braces}}'");
    }

    #[test]
    fn null_values_are_omitted() {
        let clauses = assigner().assign(&args(json!({"name": "Bob", "age": null})));
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].contains("Bob"));
    }

    #[test]
    fn undeclared_arguments_are_omitted_when_schema_present() {
        let clauses = assigner().assign(&args(json!({"name": "Charlie", "unknown_field": "x"})));
        assert_eq!(clauses, vec!["The name is 'Charlie'.".to_string()]);
    }

    #[test]
    fn no_schema_renders_everything_untyped() {
        let assigner = ArgumentAssigner::new(None);
        let clauses = assigner.assign(&args(json!({"field": "value"})));
        assert_eq!(clauses, vec!["The field is value.".to_string()]);
    }

    #[test]
    fn empty_arguments_render_no_clauses() {
        assert!(assigner().assign(&Map::new()).is_empty());
    }
}
