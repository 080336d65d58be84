//! Agent-network model: parsed specs, the immutable network, the store, and
//! the loaders that populate it.
//!
//! A network file parses into a [`NetworkSpec`]; the validation suite runs
//! over that; a passing spec becomes an immutable [`AgentNetwork`] held in the
//! [`NetworkStore`] behind [`NetworkProvider`] indirection so call sites keep a
//! stable handle across hot reloads.

mod commondefs;
mod connectivity;
mod network;
mod restorer;
mod spec;
mod store;

pub use commondefs::apply_replacement_values;
pub use connectivity::{report_network_connectivity, ConnectivityInfo};
pub use network::AgentNetwork;
pub use restorer::{ManifestRestorer, NetworkRestorer};
pub use spec::{is_url_or_path, AgentKind, AgentSpec, NetworkSpec};
pub use store::{NetworkProvider, NetworkStore, StoreEvent};
