//! `labrig config` command implementation

use colored::Colorize;
use std::path::Path;

use super::load_engine_config;
use crate::CliError;
use crate::output::{OutputFormat, to_json};

/// Execute the `labrig config` command
pub fn run(path: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let Some(path) = path else {
        return Err(CliError::ConfigError(
            "no configuration file given, pass --config <file>".to_string(),
        ));
    };
    let config = load_engine_config(Some(path))?;

    if format == OutputFormat::Json {
        println!("{}", to_json(&config)?);
        return Ok(());
    }

    println!(
        "{} Configuration is valid: {}",
        "✓".green(),
        path.display().to_string().cyan()
    );
    println!();
    let entries = [
        ("infinite_consumables", config.infinite_consumables.to_string()),
        ("allow_sharing", config.allow_sharing.to_string()),
        ("allow_in_use", config.allow_in_use.to_string()),
        ("stale_max_age_secs", config.stale_max_age_secs.to_string()),
        ("sweep_interval_secs", config.sweep_interval_secs.to_string()),
        ("low_stock_threshold", config.low_stock_threshold.to_string()),
    ];
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in entries {
        println!("  {:<width$} = {}", key, value, width = width);
    }
    Ok(())
}
