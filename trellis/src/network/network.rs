//! The immutable, validated agent network.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::validation::CompositeValidator;

use super::spec::{AgentSpec, NetworkSpec};

/// A validated agent network. Created by the restorer, replaced atomically on
/// manifest change, never mutated; everything hands out references.
#[derive(Debug)]
pub struct AgentNetwork {
    name: String,
    spec: NetworkSpec,
    front_man: String,
}

impl AgentNetwork {
    /// Validates `spec` with the given validator suite and builds the network.
    pub fn from_spec(
        name: impl Into<String>,
        spec: NetworkSpec,
        validator: &CompositeValidator,
    ) -> Result<Self, ValidationError> {
        let errors = validator.validate(&spec);
        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }
        // The unreachable-nodes validator has asserted exactly one candidate.
        let front_man = spec.front_man_candidates()[0].to_string();
        Ok(Self {
            name: name.into(),
            spec,
            front_man,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unique entry-point agent of this network.
    pub fn front_man(&self) -> &str {
        &self.front_man
    }

    pub fn agent(&self, name: &str) -> Option<&AgentSpec> {
        self.spec.agent(name)
    }

    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.spec.agent_names()
    }

    /// The network-wide default llm config each agent's config overlays.
    pub fn default_llm_config(&self) -> Option<&Map<String, Value>> {
        self.spec.llm_config.as_ref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.spec.metadata.as_ref()
    }
}
