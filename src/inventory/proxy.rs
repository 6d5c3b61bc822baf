//! Which networks the proxy itself is attached to.

use crate::inventory::model::{Container, Inventory};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

pub const SELF_CGROUP: &str = "/proc/self/cgroup";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Cannot find container id")]
    NoContainerId,

    #[error("Cannot read {path}: {source}")]
    Cgroup {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Caddy container {0} not found in inventory")]
    UnknownContainer(String),

    #[error("Caddy container id {id} is ambiguous: {candidates}")]
    AmbiguousContainer { id: String, candidates: String },
}

static CGROUP_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"docker/([A-Za-z0-9]+)").expect("cgroup regex is valid"));

/// Extract the container id from cgroup text (`.../docker/<id>`).
pub fn container_id_from_cgroup(cgroups: &str) -> Option<String> {
    CGROUP_ID_RE
        .captures(cgroups)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read this process's cgroup file and extract the container id.
pub fn own_container_id(cgroup_path: &Path) -> Result<String, DiscoveryError> {
    let cgroups = fs::read_to_string(cgroup_path).map_err(|source| DiscoveryError::Cgroup {
        path: cgroup_path.display().to_string(),
        source,
    })?;
    container_id_from_cgroup(&cgroups).ok_or(DiscoveryError::NoContainerId)
}

/// Look up the proxy container by id.
///
/// An exact id match wins. Otherwise one id must be a prefix of the other
/// (short ids as printed by `docker ps`), and exactly one container may match.
fn find_container<'a>(
    inventory: &'a Inventory,
    container_id: &str,
) -> Result<&'a Container, DiscoveryError> {
    let unknown = || DiscoveryError::UnknownContainer(container_id.to_string());
    if container_id.is_empty() {
        return Err(unknown());
    }
    if let Some(exact) = inventory.containers.iter().find(|c| c.id == container_id) {
        return Ok(exact);
    }

    let candidates: Vec<&Container> = inventory
        .containers
        .iter()
        .filter(|c| {
            !c.id.is_empty()
                && (c.id.starts_with(container_id) || container_id.starts_with(c.id.as_str()))
        })
        .collect();
    match candidates.as_slice() {
        [] => Err(unknown()),
        [only] => Ok(*only),
        many => Err(DiscoveryError::AmbiguousContainer {
            id: container_id.to_string(),
            candidates: many.iter().map(|c| c.id.as_str()).collect::<Vec<_>>().join(", "),
        }),
    }
}

/// Non-ingress network ids of the proxy container.
pub fn proxy_networks(
    inventory: &Inventory,
    container_id: &str,
) -> Result<BTreeSet<String>, DiscoveryError> {
    let container = find_container(inventory, container_id)?;

    let ingress: BTreeSet<&str> = inventory
        .networks
        .iter()
        .filter(|n| n.ingress)
        .map(|n| {
            log::debug!("ignoring ingress network {} ({})", n.name, n.id);
            n.id.as_str()
        })
        .collect();

    Ok(container
        .network_settings
        .networks
        .values()
        .map(|endpoint| endpoint.network_id.as_str())
        .filter(|id| !ingress.contains(id))
        .map(str::to_string)
        .collect())
}
