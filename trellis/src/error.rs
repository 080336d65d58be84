//! Error types shared across the runtime.
//!
//! Activation-internal failures are converted to string results so that a
//! parent chain can keep going; these enums cover the failures that are
//! allowed to surface to callers of the library API.

use thiserror::Error;

/// Failure loading or parsing network/manifest configuration.
///
/// Fatal for the network in question at load time; never kills the server.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not find manifest file at path: {0}")]
    ManifestNotFound(String),
    #[error("error parsing {path}: {message}")]
    Parse { path: String, message: String },
    #[error("network file {0} not found")]
    NetworkFileNotFound(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One or more validation-rule violations, aggregated.
#[derive(Error, Debug)]
#[error("network validation failed:\n{}", .errors.join("\n"))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// General agent-execution error.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The LLM provider returned an API error after retries.
    #[error("provider error: {0}")]
    Provider(String),
    /// A coded tool or external agent call failed.
    #[error("tool error: {0}")]
    Tool(String),
    /// The chain, tool, or umbrella timeout expired.
    #[error("timed out after {0} seconds")]
    Timeout(u64),
    /// Client disconnect or server shutdown.
    #[error("cancelled")]
    Cancelled,
    /// Authorization denied.
    #[error("not authorized for agent {0}")]
    NotAuthorized(String),
    /// The requested network does not exist in the store.
    #[error("unknown agent network: {0}")]
    UnknownNetwork(String),
    /// Anything else that should not propagate a backtrace to the client.
    #[error("{0}")]
    Internal(String),
}
