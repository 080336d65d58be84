//! The policy the server consults per request.

use std::collections::HashMap;
use std::sync::Arc;

use env_config::AgentEnv;
use tracing::debug;

use crate::network::NetworkStore;

use super::{Authorizer, Entity};

/// Answers agent-level questions using the configured [`Authorizer`] and the
/// network store. Actor/resource keys and the checked relation come from the
/// `AGENT_AUTHORIZER_*` environment.
pub struct AgentAuthorizationPolicy {
    authorizer: Arc<dyn Authorizer>,
    store: Arc<NetworkStore>,
    actor_key: String,
    actor_id_metadata_key: String,
    resource_key: String,
    allow_relation: String,
    debug_auth: bool,
}

impl AgentAuthorizationPolicy {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        store: Arc<NetworkStore>,
        agent_env: &AgentEnv,
    ) -> Self {
        Self {
            authorizer,
            store,
            actor_key: agent_env.authorizer_actor_key.clone(),
            actor_id_metadata_key: agent_env.authorizer_actor_id_metadata_key.clone(),
            resource_key: agent_env.authorizer_resource_key.clone(),
            allow_relation: agent_env.authorizer_allow_relation.clone(),
            debug_auth: agent_env.debug_auth,
        }
    }

    fn actor_from(&self, metadata: &HashMap<String, String>) -> Entity {
        let actor_id = metadata
            .get(&self.actor_id_metadata_key)
            .cloned()
            .unwrap_or_default();
        Entity::new(self.actor_key.clone(), actor_id)
    }

    /// Is the request allowed for this agent, and does the agent exist?
    pub async fn allow_agent(&self, agent_name: &str, metadata: &HashMap<String, String>) -> bool {
        let actor = self.actor_from(metadata);
        let resource = Entity::new(self.resource_key.clone(), agent_name);
        let authorized = self
            .authorizer
            .authorize(&actor, &self.allow_relation, &resource)
            .await;
        if self.debug_auth {
            debug!(
                actor = %actor.id,
                agent = agent_name,
                relation = %self.allow_relation,
                authorized,
                "authorization decision"
            );
        }
        if !authorized {
            return false;
        }
        // The network still needs to exist.
        self.store.get(agent_name).is_some()
    }

    /// The agents this request may list: the intersection of what the
    /// authorizer allows and what exists. An authorizer with no opinion
    /// allows everything that exists.
    pub async fn list_agents(&self, metadata: &HashMap<String, String>) -> Vec<String> {
        let existing = self.store.list();
        let actor = self.actor_from(metadata);
        let resource = Entity::of_type(self.resource_key.clone());
        match self
            .authorizer
            .list(&actor, &self.allow_relation, &resource)
            .await
        {
            None => existing,
            Some(authorized) => {
                let mut listed: Vec<String> = existing
                    .into_iter()
                    .filter(|name| authorized.contains(name))
                    .collect();
                listed.sort();
                listed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::authorization::NullAuthorizer;
    use crate::network::{AgentNetwork, NetworkSpec};
    use crate::validation::{CompositeValidator, ValidatorOptions};

    fn store_with(names: &[&str]) -> Arc<NetworkStore> {
        let store = Arc::new(NetworkStore::new());
        for name in names {
            let spec = NetworkSpec::parse(
                r#"{"tools": [
                    {"name": "front", "instructions": "x", "tools": ["leaf"]},
                    {"name": "leaf", "instructions": "x"}
                ]}"#,
            )
            .unwrap();
            let validator = CompositeValidator::new(ValidatorOptions::default());
            store.install(
                *name,
                Arc::new(AgentNetwork::from_spec(*name, spec, &validator).unwrap()),
            );
        }
        store
    }

    struct PickyAuthorizer {
        allowed: Vec<String>,
    }

    #[async_trait]
    impl Authorizer for PickyAuthorizer {
        async fn authorize(&self, _actor: &Entity, _action: &str, resource: &Entity) -> bool {
            self.allowed.contains(&resource.id)
        }
        async fn grant(&self, _actor: &Entity, _relation: &str, _resource: &Entity) -> bool {
            false
        }
        async fn revoke(&self, _actor: &Entity, _relation: &str, _resource: &Entity) -> bool {
            false
        }
        async fn list(
            &self,
            _actor: &Entity,
            _relation: &str,
            _resource: &Entity,
        ) -> Option<Vec<String>> {
            Some(self.allowed.clone())
        }
    }

    /// **Scenario**: with the null authorizer every existing agent lists;
    /// with a policy allowing {a, c} only that intersection lists.
    #[tokio::test]
    async fn list_is_intersection_of_allowed_and_existing() {
        let agent_env = AgentEnv::from_env();
        let store = store_with(&["a", "b", "c"]);

        let open = AgentAuthorizationPolicy::new(
            Arc::new(NullAuthorizer),
            Arc::clone(&store),
            &agent_env,
        );
        assert_eq!(
            open.list_agents(&HashMap::new()).await,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );

        let picky = AgentAuthorizationPolicy::new(
            Arc::new(PickyAuthorizer {
                allowed: vec!["a".to_string(), "c".to_string(), "ghost".to_string()],
            }),
            store,
            &agent_env,
        );
        assert_eq!(
            picky.list_agents(&HashMap::new()).await,
            vec!["a".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn allow_agent_requires_both_authorization_and_existence() {
        let agent_env = AgentEnv::from_env();
        let store = store_with(&["a"]);
        let policy = AgentAuthorizationPolicy::new(
            Arc::new(NullAuthorizer),
            Arc::clone(&store),
            &agent_env,
        );
        assert!(policy.allow_agent("a", &HashMap::new()).await);
        assert!(!policy.allow_agent("missing", &HashMap::new()).await);

        let picky = AgentAuthorizationPolicy::new(
            Arc::new(PickyAuthorizer { allowed: vec![] }),
            store,
            &agent_env,
        );
        assert!(!picky.allow_agent("a", &HashMap::new()).await);
    }
}
