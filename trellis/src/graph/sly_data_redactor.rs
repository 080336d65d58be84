//! Policy-driven filter over the out-of-band data channel.
//!
//! Applied at every trust boundary: downstream call, upstream return, and
//! external-agent dispatch. The policy is read from the agent spec through a
//! list of dotted config keys (e.g. `allow.from_downstream.sly_data`); the
//! first key that resolves wins.

use serde_json::{Map, Value};

/// Redacts a sly-data map per an agent spec's allow policy.
///
/// Policy shapes:
/// - `true` passes everything through
/// - `false` or an absent policy blocks everything
/// - a list of keys allows exactly those keys
/// - a map allows per key: `true` keeps, `false` drops, a string renames
///
/// A rename target is itself treated as allowed, which keeps redaction
/// idempotent: filtering an already-filtered map returns it unchanged.
pub struct SlyDataRedactor {
    policy: Option<Value>,
}

impl SlyDataRedactor {
    /// Looks the policy up in `spec` through `config_keys`, dotted paths
    /// evaluated in order; the first that resolves to a value wins.
    pub fn new(spec: Option<&Value>, config_keys: &[&str]) -> Self {
        let policy = spec.and_then(|spec| {
            config_keys
                .iter()
                .find_map(|key| lookup_dotted(spec, key).cloned())
        });
        Self { policy }
    }

    /// Convenience for a policy value already in hand.
    pub fn from_policy(policy: Option<Value>) -> Self {
        Self { policy }
    }

    /// Applies the policy to one sly-data map.
    pub fn filter_config(&self, sly_data: &Map<String, Value>) -> Map<String, Value> {
        let mut redacted = Map::new();
        match &self.policy {
            None => {}
            Some(Value::Bool(true)) => {
                redacted = sly_data.clone();
            }
            Some(Value::Bool(false)) => {}
            Some(Value::Array(allowed)) => {
                for key in allowed.iter().filter_map(Value::as_str) {
                    if let Some(value) = sly_data.get(key) {
                        redacted.insert(key.to_string(), value.clone());
                    }
                }
            }
            Some(Value::Object(per_key)) => {
                for (key, value) in sly_data {
                    match per_key.get(key) {
                        Some(Value::Bool(true)) => {
                            redacted.insert(key.clone(), value.clone());
                        }
                        Some(Value::String(renamed)) => {
                            redacted.insert(renamed.clone(), value.clone());
                        }
                        Some(_) => {}
                        None => {
                            // Keys that are themselves rename targets pass
                            // through, so filtering is idempotent.
                            let is_rename_target = per_key
                                .values()
                                .any(|target| target.as_str() == Some(key.as_str()));
                            if is_rename_target {
                                redacted.insert(key.clone(), value.clone());
                            }
                        }
                    }
                }
            }
            Some(_) => {}
        }
        redacted
    }
}

/// Resolves a dotted path like `allow.sly_data` inside a JSON value.
fn lookup_dotted<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in dotted.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
