//! Client-lifecycle policies for model network resources.
//!
//! Two styles exist. When a model constructor accepts a client, the policy is
//! built eagerly around that client and owns it outright. When a model builds
//! its client lazily on first use, the policy holds the model handle instead
//! and reaches in to shut the client down.

use async_trait::async_trait;

/// Releases whatever network client a model holds.
#[async_trait]
pub trait ClientPolicy: Send + Sync {
    async fn delete_resources(&mut self);
}

/// Policy for models with no client state worth releasing (mocks).
pub struct NoopClientPolicy;

#[async_trait]
impl ClientPolicy for NoopClientPolicy {
    async fn delete_resources(&mut self) {}
}
