//! Commondefs replacement: named reusable sub-objects in network files.
//!
//! `commondefs.replacement_values` maps names to JSON values. Anywhere under
//! the top-level `tools` tree a string equal to such a name appears as a
//! value, it is replaced by a deep copy of the named value. Replacement is
//! applied repeatedly so replacement values may reference one another, with a
//! depth guard against definition cycles.

use serde_json::Value;

const MAX_PASSES: usize = 8;

/// Applies `commondefs.replacement_values` to the `tools` tree of a parsed
/// network file in place. A file without commondefs is left untouched.
pub fn apply_replacement_values(file: &mut Value) {
    let Some(replacements) = file
        .get("commondefs")
        .and_then(|defs| defs.get("replacement_values"))
        .cloned()
    else {
        return;
    };
    let Some(replacements) = replacements.as_object() else {
        return;
    };
    let Some(tools) = file.get_mut("tools") else {
        return;
    };

    for _ in 0..MAX_PASSES {
        if !replace_in(tools, replacements) {
            break;
        }
    }
}

/// One replacement pass. Returns true when anything changed.
fn replace_in(value: &mut Value, replacements: &serde_json::Map<String, Value>) -> bool {
    match value {
        Value::String(s) => {
            if let Some(replacement) = replacements.get(s.as_str()) {
                *value = replacement.clone();
                return true;
            }
            false
        }
        Value::Array(items) => {
            let mut changed = false;
            for item in items {
                changed |= replace_in(item, replacements);
            }
            changed
        }
        Value::Object(map) => {
            let mut changed = false;
            for (_, item) in map.iter_mut() {
                changed |= replace_in(item, replacements);
            }
            changed
        }
        _ => false,
    }
}
