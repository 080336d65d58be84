//! Typed accessors for the `AGENT_*` environment variables the runtime consults.
//!
//! Reading happens once at process init (after [`crate::load_and_apply`]); the
//! resulting [`AgentEnv`] is passed as a dependency from there on, so nothing
//! downstream reaches into the environment directly.

use std::env;

/// Names of the environment variables read into [`AgentEnv`].
pub const AGENT_MANIFEST_FILE: &str = "AGENT_MANIFEST_FILE";
pub const AGENT_AUTHORIZER: &str = "AGENT_AUTHORIZER";
pub const AGENT_AUTHORIZER_ACTOR_KEY: &str = "AGENT_AUTHORIZER_ACTOR_KEY";
pub const AGENT_AUTHORIZER_ACTOR_ID_METADATA_KEY: &str = "AGENT_AUTHORIZER_ACTOR_ID_METADATA_KEY";
pub const AGENT_AUTHORIZER_RESOURCE_KEY: &str = "AGENT_AUTHORIZER_RESOURCE_KEY";
pub const AGENT_AUTHORIZER_ALLOW_RELATION: &str = "AGENT_AUTHORIZER_ALLOW_RELATION";
pub const AGENT_ALLOW_CORS_HEADERS: &str = "AGENT_ALLOW_CORS_HEADERS";
pub const AGENT_TRACING_METADATA_ENV_VARS: &str = "AGENT_TRACING_METADATA_ENV_VARS";
pub const AGENT_DEBUG_AUTH: &str = "AGENT_DEBUG_AUTH";
pub const AGENT_TOOLBOX_INFO_FILE: &str = "AGENT_TOOLBOX_INFO_FILE";

/// Snapshot of the `AGENT_*` environment taken at startup.
#[derive(Clone, Debug, Default)]
pub struct AgentEnv {
    /// Path of the manifest file enumerating hosted networks, if overridden.
    pub manifest_file: Option<String>,
    /// Registered name of the authorizer implementation to construct.
    pub authorizer: Option<String>,
    /// Actor type key for authorization checks. Defaults to `User`.
    pub authorizer_actor_key: String,
    /// Request-metadata key that carries the actor id. Defaults to `user_id`.
    pub authorizer_actor_id_metadata_key: String,
    /// Resource type key for authorization checks. Defaults to `AgentNetwork`.
    pub authorizer_resource_key: String,
    /// Relation checked for access. Defaults to `read`.
    pub authorizer_allow_relation: String,
    /// Extra CORS allow-headers, comma separated.
    pub allow_cors_headers: Option<String>,
    /// Env var names whose values should be attached to tracing spans.
    pub tracing_metadata_env_vars: Vec<String>,
    /// Log authorization decisions when true.
    pub debug_auth: bool,
    /// Optional user toolbox info file layered over the built-in one.
    pub toolbox_info_file: Option<String>,
}

impl AgentEnv {
    /// Reads the current process environment into a snapshot.
    pub fn from_env() -> Self {
        Self {
            manifest_file: env::var(AGENT_MANIFEST_FILE).ok(),
            authorizer: env::var(AGENT_AUTHORIZER).ok(),
            authorizer_actor_key: env::var(AGENT_AUTHORIZER_ACTOR_KEY)
                .unwrap_or_else(|_| "User".to_string()),
            authorizer_actor_id_metadata_key: env::var(AGENT_AUTHORIZER_ACTOR_ID_METADATA_KEY)
                .unwrap_or_else(|_| "user_id".to_string()),
            authorizer_resource_key: env::var(AGENT_AUTHORIZER_RESOURCE_KEY)
                .unwrap_or_else(|_| "AgentNetwork".to_string()),
            authorizer_allow_relation: env::var(AGENT_AUTHORIZER_ALLOW_RELATION)
                .unwrap_or_else(|_| "read".to_string()),
            allow_cors_headers: env::var(AGENT_ALLOW_CORS_HEADERS).ok(),
            tracing_metadata_env_vars: env::var(AGENT_TRACING_METADATA_ENV_VARS)
                .map(|csv| {
                    csv.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            debug_auth: env::var(AGENT_DEBUG_AUTH)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            toolbox_info_file: env::var(AGENT_TOOLBOX_INFO_FILE).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // Build from an empty slate by clearing anything a dev shell may have set.
        for key in [
            AGENT_AUTHORIZER_ACTOR_KEY,
            AGENT_AUTHORIZER_ACTOR_ID_METADATA_KEY,
            AGENT_AUTHORIZER_RESOURCE_KEY,
            AGENT_AUTHORIZER_ALLOW_RELATION,
            AGENT_DEBUG_AUTH,
        ] {
            env::remove_var(key);
        }
        let agent_env = AgentEnv::from_env();
        assert_eq!(agent_env.authorizer_actor_key, "User");
        assert_eq!(agent_env.authorizer_actor_id_metadata_key, "user_id");
        assert_eq!(agent_env.authorizer_resource_key, "AgentNetwork");
        assert_eq!(agent_env.authorizer_allow_relation, "read");
        assert!(!agent_env.debug_auth);
    }

    #[test]
    fn tracing_metadata_csv_is_split_and_trimmed() {
        env::set_var(AGENT_TRACING_METADATA_ENV_VARS, "REQ_ID, DEPLOY_ENV ,,");
        let agent_env = AgentEnv::from_env();
        env::remove_var(AGENT_TRACING_METADATA_ENV_VARS);
        assert_eq!(
            agent_env.tracing_metadata_env_vars,
            vec!["REQ_ID".to_string(), "DEPLOY_ENV".to_string()]
        );
    }
}
