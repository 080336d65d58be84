//! The always-open authorizer.

use async_trait::async_trait;

use super::{Authorizer, Entity};

/// Accepts everything and has no opinion on listing. The default when no
/// policy backend is configured.
pub struct NullAuthorizer;

#[async_trait]
impl Authorizer for NullAuthorizer {
    async fn authorize(&self, _actor: &Entity, _action: &str, _resource: &Entity) -> bool {
        // By default, anyone can do anything.
        true
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
        // No opinion; let some other mechanism decide.
        None
    }
}
