//! Parsed shape of an agent-network file.
//!
//! A file's `tools` list parses into one [`AgentSpec`] per agent. Which kind
//! of agent a spec describes is implied by its fields: `instructions` makes an
//! LLM agent, `class` a coded tool, and neither makes a toolbox entry whose
//! name resolves through the toolbox registry. References to `/…` or
//! `http(s)://…` appear only inside `tools` lists and are never nodes.

use serde::Deserialize;
use serde_json::{Map, Value};

/// What kind of node an [`AgentSpec`] declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentKind {
    LlmAgent,
    CodedTool,
    Toolbox,
}

/// One agent declaration from a network file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    /// Present (and non-empty) on LLM agents.
    #[serde(default)]
    pub instructions: Option<String>,
    /// Extra instruction appended when the agent is invoked as a front-man.
    #[serde(default)]
    pub command: Option<String>,
    /// Symbolic `module.path.ClassName` reference; present on coded tools.
    #[serde(default)]
    pub class: Option<String>,
    /// Parameter schema for the agent as a callable function.
    #[serde(default)]
    pub function: Option<Value>,
    /// Ordered downstream references: agent names, `/paths`, or URLs.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Agent-local llm config, overlaid on the network default.
    #[serde(default)]
    pub llm_config: Option<Map<String, Value>>,
    /// Allow policies (sly data flow, downstream reporting); shape is
    /// interpreted by the redactor, so it stays an open value here.
    #[serde(default)]
    pub allow: Option<Value>,
    /// Agent-specific error fragments for the error detector.
    #[serde(default)]
    pub error_fragments: Vec<String>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub max_execution_seconds: Option<u64>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    /// User-supplied args for toolbox entries, merged over declared args.
    #[serde(default)]
    pub args: Option<Map<String, Value>>,
}

impl AgentSpec {
    pub fn kind(&self) -> AgentKind {
        if self.class.is_some() {
            AgentKind::CodedTool
        } else if self.instructions.is_some() {
            AgentKind::LlmAgent
        } else {
            AgentKind::Toolbox
        }
    }

    /// The parameter properties of the function schema, when declared.
    pub fn function_properties(&self) -> Option<&Map<String, Value>> {
        self.function
            .as_ref()?
            .get("parameters")?
            .get("properties")?
            .as_object()
    }
}

/// Is this tool reference an external URL or path rather than an agent name?
pub fn is_url_or_path(tool: &str) -> bool {
    tool.starts_with('/') || tool.starts_with("http://") || tool.starts_with("https://")
}

/// A whole parsed network file, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NetworkSpec {
    #[serde(default)]
    pub tools: Vec<AgentSpec>,
    #[serde(default)]
    pub llm_config: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub commondefs: Option<Map<String, Value>>,
}

impl NetworkSpec {
    /// Parses a network file body (JSON) into a spec, applying commondefs
    /// replacement values before the `tools` list is interpreted.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(body)?;
        super::commondefs::apply_replacement_values(&mut value);
        serde_json::from_value(value)
    }

    pub fn agent(&self, name: &str) -> Option<&AgentSpec> {
        self.tools.iter().find(|spec| spec.name == name)
    }

    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|spec| spec.name.as_str())
    }

    /// Front-man candidates: agents that have downstream references but are
    /// not themselves referenced by any other agent.
    pub fn front_man_candidates(&self) -> Vec<&str> {
        let mut as_down_chains: std::collections::HashSet<&str> = std::collections::HashSet::new();
        let mut has_down_chains: Vec<&str> = Vec::new();
        for spec in &self.tools {
            if !spec.tools.is_empty() {
                has_down_chains.push(spec.name.as_str());
                for tool in &spec.tools {
                    as_down_chains.insert(tool.as_str());
                }
            }
        }
        has_down_chains
            .into_iter()
            .filter(|name| !as_down_chains.contains(name))
            .collect()
    }
}
