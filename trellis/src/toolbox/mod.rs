//! Toolbox registry: named, reusable tools shared across networks.
//!
//! Declarations live in YAML: the built-in table is embedded at compile time
//! and a user file named by `AGENT_TOOLBOX_INFO_FILE` layers over it. Each
//! entry names a `class` resolved through a compile-time constructor
//! registry; construction merges user args over declared args and validates
//! the merged set against the constructor's accepted keys.

pub mod mcp;
mod tool;
mod web_fetch;

pub use mcp::{McpToolInfo, McpToolProvider, McpToolkit};
pub use tool::{Tool, ToolProduct, Toolkit, LANGCHAIN_TOOL_TAG};
pub use web_fetch::{WebFetchConstructor, WebFetchTool};

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

const EMBEDDED_TOOLBOX_INFO: &str = include_str!("toolbox_info.yaml");

#[derive(Error, Debug)]
pub enum ToolboxError {
    #[error("toolbox entry '{0}' not found")]
    UnknownEntry(String),
    #[error("toolbox class '{0}' is not registered")]
    UnknownClass(String),
    #[error("invalid args for toolbox entry '{entry}': {keys:?}")]
    InvalidArgs { entry: String, keys: Vec<String> },
    #[error("toolbox info parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("toolbox info read error: {0}")]
    Io(#[from] std::io::Error),
}

/// One declared toolbox entry.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolboxInfo {
    pub class: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// Constructor for one toolbox class.
pub trait ToolConstructor: Send + Sync {
    /// Argument keys the constructor understands. Anything else fails fast.
    fn accepted_args(&self) -> &'static [&'static str];

    fn construct(
        &self,
        name: &str,
        description: &str,
        parameters: &Value,
        args: &Map<String, Value>,
    ) -> Result<ToolProduct, ToolboxError>;
}

/// Resolves toolbox entry names to invokable tools.
pub struct ToolboxRegistry {
    infos: HashMap<String, ToolboxInfo>,
    constructors: HashMap<String, Arc<dyn ToolConstructor>>,
}

impl ToolboxRegistry {
    /// Builds the registry from the embedded declarations plus an optional
    /// user file, with the built-in constructors registered.
    pub fn standard(user_info_file: Option<&str>) -> Result<Self, ToolboxError> {
        let mut infos: HashMap<String, ToolboxInfo> = serde_yaml::from_str(EMBEDDED_TOOLBOX_INFO)?;
        if let Some(path) = user_info_file {
            let body = std::fs::read_to_string(path)?;
            let user_infos: HashMap<String, ToolboxInfo> = serde_yaml::from_str(&body)?;
            infos.extend(user_infos);
        }

        let mut registry = Self {
            infos,
            constructors: HashMap::new(),
        };
        registry.register_class("web.WebFetch", Arc::new(WebFetchConstructor));
        Ok(registry)
    }

    /// Registers (or replaces) a class constructor.
    pub fn register_class(
        &mut self,
        class: impl Into<String>,
        constructor: Arc<dyn ToolConstructor>,
    ) {
        self.constructors.insert(class.into(), constructor);
    }

    /// Adds a declared entry programmatically (tests, server extensions).
    pub fn register_entry(&mut self, name: impl Into<String>, info: ToolboxInfo) {
        self.infos.insert(name.into(), info);
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.infos.contains_key(name)
    }

    pub fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.infos.keys().cloned().collect();
        names.sort();
        names
    }

    /// Builds the tools for one entry. User args merge over declared args
    /// (user wins); the merged set is validated against the constructor's
    /// accepted keys and unknown keys fail fast.
    pub fn create_tool_from_toolbox(
        &self,
        name: &str,
        user_args: Option<&Map<String, Value>>,
    ) -> Result<Vec<Arc<dyn Tool>>, ToolboxError> {
        let info = self
            .infos
            .get(name)
            .ok_or_else(|| ToolboxError::UnknownEntry(name.to_string()))?;
        let constructor = self
            .constructors
            .get(&info.class)
            .ok_or_else(|| ToolboxError::UnknownClass(info.class.clone()))?;

        let mut merged = info.args.clone();
        if let Some(user_args) = user_args {
            for (key, value) in user_args {
                merged.insert(key.clone(), value.clone());
            }
        }

        let accepted = constructor.accepted_args();
        let invalid: Vec<String> = merged
            .keys()
            .filter(|key| !accepted.contains(&key.as_str()))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(ToolboxError::InvalidArgs {
                entry: name.to_string(),
                keys: invalid,
            });
        }

        debug!(entry = name, class = %info.class, "constructing toolbox tool");
        let product = constructor.construct(name, &info.description, &info.parameters, &merged)?;
        Ok(product.into_tools())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::AgentError;

    struct RecordingTool {
        name: String,
        args: Map<String, Value>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            "records"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn call(&self, _args: &Map<String, Value>) -> Result<Value, AgentError> {
            Ok(Value::Object(self.args.clone()))
        }
    }

    struct RecordingConstructor;

    impl ToolConstructor for RecordingConstructor {
        fn accepted_args(&self) -> &'static [&'static str] {
            &["param1", "param2", "param3"]
        }

        fn construct(
            &self,
            name: &str,
            _description: &str,
            _parameters: &Value,
            args: &Map<String, Value>,
        ) -> Result<ToolProduct, ToolboxError> {
            Ok(ToolProduct::Single(Arc::new(RecordingTool {
                name: name.to_string(),
                args: args.clone(),
            })))
        }
    }

    fn registry_with_entry() -> ToolboxRegistry {
        let mut registry = ToolboxRegistry::standard(None).unwrap();
        registry.register_class("mock.TestTool", Arc::new(RecordingConstructor));
        registry.register_entry(
            "test_tool",
            ToolboxInfo {
                class: "mock.TestTool".to_string(),
                description: String::new(),
                parameters: Value::Null,
                args: serde_json::from_value(json!({"param1": "value1", "param2": "value2"}))
                    .unwrap(),
            },
        );
        registry
    }

    /// **Scenario**: user args merge over declared args with user winning,
    /// and the merged set reaches the constructor.
    #[tokio::test]
    async fn user_args_win_on_merge() {
        let registry = registry_with_entry();
        let user_args: Map<String, Value> =
            serde_json::from_value(json!({"param2": "user_value", "param3": "extra_value"}))
                .unwrap();
        let tools = registry
            .create_tool_from_toolbox("test_tool", Some(&user_args))
            .unwrap();
        assert_eq!(tools.len(), 1);

        let seen = tools[0].call(&Map::new()).await.unwrap();
        assert_eq!(seen["param1"], "value1");
        assert_eq!(seen["param2"], "user_value");
        assert_eq!(seen["param3"], "extra_value");
    }

    #[test]
    fn unknown_arg_keys_fail_fast() {
        let registry = registry_with_entry();
        let user_args: Map<String, Value> =
            serde_json::from_value(json!({"bogus": true})).unwrap();
        let err = registry
            .create_tool_from_toolbox("test_tool", Some(&user_args))
            .unwrap_err();
        assert!(matches!(err, ToolboxError::InvalidArgs { .. }));
    }

    #[test]
    fn unknown_entry_and_class_are_distinct_errors() {
        let mut registry = ToolboxRegistry::standard(None).unwrap();
        assert!(matches!(
            registry.create_tool_from_toolbox("missing", None),
            Err(ToolboxError::UnknownEntry(_))
        ));

        registry.register_entry(
            "dangling",
            ToolboxInfo {
                class: "no.Such".to_string(),
                description: String::new(),
                parameters: Value::Null,
                args: Map::new(),
            },
        );
        assert!(matches!(
            registry.create_tool_from_toolbox("dangling", None),
            Err(ToolboxError::UnknownClass(_))
        ));
    }

    #[test]
    fn embedded_declarations_include_web_fetch() {
        let registry = ToolboxRegistry::standard(None).unwrap();
        assert!(registry.has_entry("web_fetch"));
        let tools = registry.create_tool_from_toolbox("web_fetch", None).unwrap();
        assert_eq!(tools[0].name(), "web_fetch");
        assert!(tools[0].tags().contains(&LANGCHAIN_TOOL_TAG.to_string()));
    }
}
