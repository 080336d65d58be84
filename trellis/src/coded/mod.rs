//! Coded tools: user-supplied code-backed tools resolved by symbolic reference.
//!
//! A coded tool is referenced from a network file as
//! `class = "module.path.ClassName"`. Construction goes through a registry of
//! factories populated at process init; resolution tries progressively
//! shorter package prefixes derived from the network's registry location
//! before the bare class path, mirroring how networks shipped alongside their
//! tools expect local references to win.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

/// A code-backed tool. Implementations take no constructor arguments; any
/// state they need arrives through `args` and the shared `sly_data`.
///
/// Errors come back as plain strings: the activation layer converts them to
/// `"Error: …"` results so a parent chain can keep going.
#[async_trait]
pub trait CodedTool: Send + Sync {
    async fn invoke(
        &self,
        args: &Map<String, Value>,
        sly_data: &mut Map<String, Value>,
    ) -> Result<Value, String>;
}

/// Factory closure for one coded-tool class.
pub type CodedToolFactory = Arc<dyn Fn() -> Box<dyn CodedTool> + Send + Sync>;

/// Registry from class path to factory. Populated once at process init and
/// passed as a dependency; there is no process-wide lookup.
#[derive(Default, Clone)]
pub struct CodedToolRegistry {
    factories: HashMap<String, CodedToolFactory>,
}

impl CodedToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, class_path: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn CodedTool> + Send + Sync + 'static,
    {
        self.factories.insert(class_path.into(), Arc::new(factory));
    }

    /// Resolves `class` against the registry, trying `search_prefixes` from
    /// most to least specific before the bare class path. The first hit wins.
    pub fn resolve(&self, class: &str, search_prefixes: &[String]) -> Option<Box<dyn CodedTool>> {
        for prefix in search_prefixes {
            let qualified = format!("{prefix}.{class}");
            if let Some(factory) = self.factories.get(&qualified) {
                debug!(class = %qualified, "resolved coded tool");
                return Some(factory());
            }
        }
        self.factories.get(class).map(|factory| {
            debug!(class = %class, "resolved coded tool");
            factory()
        })
    }
}

/// Progressively-shorter package prefixes for a network's registry location,
/// e.g. `pkg.net.sub` yields `["pkg.net.sub", "pkg.net", "pkg"]`.
pub fn search_prefixes(registry_location: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let mut parts: Vec<&str> = registry_location
        .split('.')
        .filter(|part| !part.is_empty())
        .collect();
    while !parts.is_empty() {
        prefixes.push(parts.join("."));
        parts.pop();
    }
    prefixes
}
