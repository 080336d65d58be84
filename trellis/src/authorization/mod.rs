//! Authorization: actor × action × resource decisions over agent resources.
//!
//! The [`Authorizer`] trait is shaped after what policy engines provide;
//! [`NullAuthorizer`] short-circuits everything open. The
//! [`AgentAuthorizationPolicy`] sits in front of the network store and
//! answers the two questions the server asks: may this request reach this
//! agent, and which agents may it list.

mod factory;
mod null;
mod policy;

pub use factory::AuthorizerFactory;
pub use null::NullAuthorizer;
pub use policy::AgentAuthorizationPolicy;

use async_trait::async_trait;

/// An entity seeking or granting permission, e.g. `User:alice`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    /// The type key, e.g. `User` or `AgentNetwork`.
    pub entity_type: String,
    /// The id; empty on a resource when listing a whole type.
    pub id: String,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// A resource reference with no specific id, for list queries.
    pub fn of_type(entity_type: impl Into<String>) -> Self {
        Self::new(entity_type, "")
    }
}

/// Policy backend interface.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// May `actor` take `action` on `resource`?
    async fn authorize(&self, actor: &Entity, action: &str, resource: &Entity) -> bool;

    /// Records that `actor` has `relation` to `resource`. Returns false when
    /// the grant already existed or the backend does not record grants.
    async fn grant(&self, actor: &Entity, relation: &str, resource: &Entity) -> bool;

    /// Removes a recorded relation. Returns false when nothing was removed.
    async fn revoke(&self, actor: &Entity, relation: &str, resource: &Entity) -> bool;

    /// Resource ids of `resource.entity_type` that `actor` has `relation` to.
    /// `None` means the backend has no opinion and some other mechanism
    /// should be used.
    async fn list(&self, actor: &Entity, relation: &str, resource: &Entity) -> Option<Vec<String>>;
}
