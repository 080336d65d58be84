//! Named collection of agent networks, hot-reloaded from a manifest.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use super::network::AgentNetwork;

/// What happened to a network during a `replace_all`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Added(String),
    Modified(String),
    Removed(String),
}

/// Thread-safe map from network name to the current [`AgentNetwork`].
///
/// The manifest watcher is the single writer (via [`NetworkStore::replace_all`]);
/// readers take consistent snapshots through [`NetworkProvider`]s. An in-flight
/// turn that resolved a network keeps its `Arc` alive across reloads.
#[derive(Default)]
pub struct NetworkStore {
    map: RwLock<HashMap<String, Arc<AgentNetwork>>>,
}

impl NetworkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentNetwork>> {
        self.map
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Names of the currently hosted networks, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .map
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Installs or replaces a single network.
    pub fn install(&self, name: impl Into<String>, network: Arc<AgentNetwork>) {
        let name = name.into();
        info!(network = %name, "installing agent network");
        self.map
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, network);
    }

    /// Atomically replaces the whole map, returning what changed.
    pub fn replace_all(&self, networks: HashMap<String, Arc<AgentNetwork>>) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        let mut map = self.map.write().unwrap_or_else(|e| e.into_inner());
        for name in map.keys() {
            if !networks.contains_key(name) {
                events.push(StoreEvent::Removed(name.clone()));
            }
        }
        for name in networks.keys() {
            if map.contains_key(name) {
                events.push(StoreEvent::Modified(name.clone()));
            } else {
                events.push(StoreEvent::Added(name.clone()));
            }
        }
        *map = networks;
        events
    }

    /// A stable handle for `name` that resolves the current network on use.
    pub fn get_provider(self: &Arc<Self>, name: impl Into<String>) -> NetworkProvider {
        NetworkProvider {
            store: Arc::clone(self),
            name: name.into(),
        }
    }
}

/// Indirection to a named network inside a store.
///
/// `resolve()` is the only supported way activations reach a network during a
/// run: the `Arc` it returns pins the network an in-flight turn started on
/// even if the store is reloaded underneath.
#[derive(Clone)]
pub struct NetworkProvider {
    store: Arc<NetworkStore>,
    name: String,
}

impl NetworkProvider {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolve(&self) -> Option<Arc<AgentNetwork>> {
        self.store.get(&self.name)
    }
}
