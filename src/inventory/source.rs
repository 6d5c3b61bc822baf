use crate::Result;
use crate::inventory::model::Inventory;
use anyhow::Context;
use std::fs;
use std::path::PathBuf;

/// Where workload snapshots come from.
pub trait InventorySource {
    fn snapshot(&self) -> Result<Inventory>;
}

/// Reads a JSON inventory snapshot from disk on every call.
#[derive(Debug, Clone)]
pub struct JsonFileInventory {
    path: PathBuf,
}

impl JsonFileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InventorySource for JsonFileInventory {
    fn snapshot(&self) -> Result<Inventory> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("read inventory file {}", self.path.display()))?;
        let inventory: Inventory = serde_json::from_str(&text)
            .with_context(|| format!("parse inventory file {}", self.path.display()))?;
        log::debug!(
            "loaded inventory from {}: {} containers, {} services",
            self.path.display(),
            inventory.containers.len(),
            inventory.services.len()
        );
        Ok(inventory)
    }
}
