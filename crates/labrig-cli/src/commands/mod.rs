//! Command implementations

pub mod config_cmd;
pub mod low_stock;
pub mod plan;

use std::path::Path;
use std::sync::Arc;

use labrig_foundation::{EngineConfig, InMemoryInventory, ResourceEngine};

use crate::CliError;
use crate::documents::InventoryDocument;

/// The engine configuration from `--config`, or the defaults.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => EngineConfig::from_file(&path.to_string_lossy())
            .map_err(|report| CliError::ConfigError(format!("{report:?}"))),
        None => Ok(EngineConfig::default()),
    }
}

/// An engine over an in-memory copy of the inventory document.
fn engine_for(doc: InventoryDocument, config: EngineConfig) -> Result<ResourceEngine, CliError> {
    let categories = Arc::new(doc.categories());
    ResourceEngine::builder()
        .with_config(config)
        .with_inventory(InMemoryInventory::shared(doc.instances))
        .with_categories(categories)
        .build()
        .map_err(|report| CliError::Engine(report.to_string()))
}
