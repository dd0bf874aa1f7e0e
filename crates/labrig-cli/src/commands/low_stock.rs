//! `labrig low-stock` command implementation

use colored::Colorize;
use std::path::Path;

use labrig_foundation::EngineConfig;

use super::engine_for;
use crate::CliError;
use crate::documents::InventoryDocument;
use crate::output::{OutputFormat, table, to_json};

/// Execute the `labrig low-stock` command
pub fn run(
    inventory: &Path,
    threshold: Option<f64>,
    config: EngineConfig,
    format: OutputFormat,
) -> Result<(), CliError> {
    let threshold = threshold.unwrap_or(config.low_stock_threshold);
    let engine = engine_for(InventoryDocument::load(inventory)?, config)?;
    let low = engine
        .low_stock_report(Some(threshold))
        .map_err(|e| CliError::Engine(e.to_string()))?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&low)?),
        OutputFormat::Table => {
            let rows = low
                .iter()
                .map(|inst| {
                    vec![
                        inst.id.to_string(),
                        inst.type_identifier.clone(),
                        fmt_capacity(inst.capacity_remaining),
                        fmt_capacity(inst.capacity_max),
                        inst.location.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                table(&["id", "type", "remaining", "max", "location"], rows)
            );
        }
        OutputFormat::Text => {
            println!("{} Consumables at or below {}", "->".green(), threshold);
            println!();
            if low.is_empty() {
                println!("  Nothing is running low.");
            }
            for inst in &low {
                println!(
                    "  {} {} ({}): {} of {} left",
                    "Warning".yellow(),
                    inst.id.to_string().cyan(),
                    inst.type_identifier,
                    fmt_capacity(inst.capacity_remaining),
                    fmt_capacity(inst.capacity_max),
                );
            }
        }
    }

    Ok(())
}

fn fmt_capacity(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
