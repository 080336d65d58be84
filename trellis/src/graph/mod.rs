//! The call tree: activations and the policies applied at its boundaries.

mod activation;
mod coded_tool;
mod external;
mod llm_agent;
mod sly_data_redactor;
mod toolbox_tool;

pub use activation::{
    sanitize_function_name, ActivationFactory, ActivationResult, CallableActivation, ResolvedTool,
    ToolTarget,
};
pub use coded_tool::CodedToolActivation;
pub use external::ExternalActivation;
pub use llm_agent::LlmAgentActivation;
pub use sly_data_redactor::SlyDataRedactor;
pub use toolbox_tool::ToolboxActivation;
