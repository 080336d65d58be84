//! Resolving the configured authorizer implementation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::{Authorizer, NullAuthorizer};

/// Registry from authorizer name (the `AGENT_AUTHORIZER` value) to
/// constructor. `null` is built in and is the default; policy-backed
/// backends register themselves at process init.
pub struct AuthorizerFactory {
    constructors: HashMap<String, Arc<dyn Fn() -> Arc<dyn Authorizer> + Send + Sync>>,
}

impl AuthorizerFactory {
    pub fn standard() -> Self {
        let mut factory = Self {
            constructors: HashMap::new(),
        };
        factory.register("null", || Arc::new(NullAuthorizer));
        factory
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Arc<dyn Authorizer> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    /// Builds the authorizer named by configuration; `None` or an unknown
    /// name falls back to the null authorizer.
    pub fn create_authorizer(&self, name: Option<&str>) -> Arc<dyn Authorizer> {
        let name = name.unwrap_or("null");
        match self.constructors.get(name) {
            Some(constructor) => {
                info!(authorizer = name, "using configured authorizer");
                constructor()
            }
            None => {
                info!(authorizer = name, "unknown authorizer, falling back to null");
                Arc::new(NullAuthorizer)
            }
        }
    }
}

impl Default for AuthorizerFactory {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::Entity;

    #[tokio::test]
    async fn default_and_unknown_names_yield_null() {
        let factory = AuthorizerFactory::standard();
        let actor = Entity::new("User", "u");
        let resource = Entity::new("AgentNetwork", "n");
        assert!(
            factory
                .create_authorizer(None)
                .authorize(&actor, "read", &resource)
                .await
        );
        assert!(
            factory
                .create_authorizer(Some("nonexistent"))
                .authorize(&actor, "read", &resource)
                .await
        );
    }
}
