//! Structural and semantic validation of agent networks.
//!
//! Each rule is its own [`NetworkValidator`]; the [`CompositeValidator`] runs
//! them in a fixed order and concatenates their error strings. A network only
//! becomes an [`AgentNetwork`](crate::network::AgentNetwork) once the
//! composite returns no errors.

mod cycles;
mod keyword;
mod missing_nodes;
mod tool_name;
mod unreachable;
mod url;

pub use cycles::CyclesValidator;
pub use keyword::KeywordValidator;
pub use missing_nodes::MissingNodesValidator;
pub use tool_name::ToolNameValidator;
pub use unreachable::UnreachableNodesValidator;
pub use url::UrlValidator;

use crate::network::NetworkSpec;

/// One validation rule over a parsed network spec.
pub trait NetworkValidator: Send + Sync {
    /// Returns a list of human-readable error strings; empty means pass.
    fn validate(&self, spec: &NetworkSpec) -> Vec<String>;
}

/// Knobs that change which rules run and what they accept.
#[derive(Clone, Debug, Default)]
pub struct ValidatorOptions {
    /// When true, cycles are permitted and the cycle rule is skipped.
    pub include_cycles: bool,
    /// External agent references (paths/URLs) the url rule accepts.
    pub external_agents: Vec<String>,
    /// MCP server URLs the url rule accepts.
    pub mcp_servers: Vec<String>,
}

/// Runs the whole rule suite in fixed order.
pub struct CompositeValidator {
    validators: Vec<Box<dyn NetworkValidator>>,
}

impl CompositeValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        let mut validators: Vec<Box<dyn NetworkValidator>> = vec![
            Box::new(KeywordValidator),
            Box::new(MissingNodesValidator),
            Box::new(UnreachableNodesValidator),
            Box::new(ToolNameValidator::new()),
        ];
        if !options.include_cycles {
            validators.push(Box::new(CyclesValidator));
        }
        validators.push(Box::new(UrlValidator::new(
            options.external_agents,
            options.mcp_servers,
        )));
        Self { validators }
    }

    pub fn validate(&self, spec: &NetworkSpec) -> Vec<String> {
        let mut errors = Vec::new();
        for validator in &self.validators {
            errors.extend(validator.validate(spec));
        }
        errors
    }
}
