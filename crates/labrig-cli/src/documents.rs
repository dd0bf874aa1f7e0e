//! Inventory and protocol documents read by the CLI.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use labrig_foundation::StaticTaxonomy;
use labrig_kernel::config::load_config;
use labrig_kernel::{AssetRequirement, ResourceCategory, ResourceInstance};

use crate::CliError;

/// Instances plus the taxonomy facts needed to classify them.
#[derive(Debug, Default, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub instances: Vec<ResourceInstance>,
    /// Category facts as exported by class discovery.
    #[serde(default)]
    pub taxonomy: Vec<TaxonomyEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyEntry {
    pub type_identifier: String,
    pub category: ResourceCategory,
}

impl InventoryDocument {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        load(path)
    }

    pub fn categories(&self) -> StaticTaxonomy {
        self.taxonomy
            .iter()
            .map(|entry| (entry.type_identifier.as_str(), entry.category))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProtocolDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub requirements: Vec<AssetRequirement>,
}

impl ProtocolDocument {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        load(path)
    }
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let path_str = path.to_string_lossy();
    debug!(path = %path_str, "loading document");
    load_config(&path_str).map_err(|e| CliError::Document {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
