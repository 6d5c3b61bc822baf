//! Inventory layer: workload snapshot types, where snapshots come from, and
//! the proxy's own network membership.

pub mod model;
pub mod proxy;
pub mod source;

pub use model::{Container, Inventory, Service};
pub use proxy::{DiscoveryError, SELF_CGROUP, own_container_id, proxy_networks};
pub use source::{InventorySource, JsonFileInventory};
