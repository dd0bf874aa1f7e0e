//! `labrig plan` command implementation

use colored::Colorize;
use std::path::Path;

use labrig_foundation::EngineConfig;
use labrig_kernel::{AssignmentPlan, PlanOptions};

use super::engine_for;
use crate::CliError;
use crate::documents::{InventoryDocument, ProtocolDocument};
use crate::output::{OutputFormat, table, to_json};

/// Execute the `labrig plan` command
///
/// Returns whether every mandatory requirement was met.
pub fn run(
    inventory: &Path,
    protocol: &Path,
    flags: PlanOptions,
    config: EngineConfig,
    format: OutputFormat,
) -> Result<bool, CliError> {
    let inventory_doc = InventoryDocument::load(inventory)?;
    let protocol_doc = ProtocolDocument::load(protocol)?;

    let options = merge_options(config.plan_options(), flags);
    let engine = engine_for(inventory_doc, config)?;
    let plan = engine
        .plan(&protocol_doc.requirements, options)
        .map_err(|e| CliError::Engine(e.to_string()))?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&plan)?),
        OutputFormat::Table => println!("{}", render_table(&plan)),
        OutputFormat::Text => print_text(protocol_doc.name.as_deref(), &plan),
    }

    Ok(plan.is_complete())
}

/// Command-line flags can only switch policies on.
fn merge_options(configured: PlanOptions, flags: PlanOptions) -> PlanOptions {
    PlanOptions {
        infinite_consumables: configured.infinite_consumables || flags.infinite_consumables,
        allow_sharing: configured.allow_sharing || flags.allow_sharing,
        allow_in_use: configured.allow_in_use || flags.allow_in_use,
    }
}

fn render_table(plan: &AssignmentPlan) -> String {
    let mut rows: Vec<Vec<String>> = plan
        .assignments
        .iter()
        .map(|a| {
            let met = a.is_filled() || a.optional;
            vec![
                a.requirement_name.clone(),
                a.category.to_string(),
                a.resource_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                if a.shared { "yes" } else { "no" }.to_string(),
                if met { "met" } else { "unmet" }.to_string(),
            ]
        })
        .collect();
    for gap in &plan.gaps {
        rows.push(vec![
            gap.type_identifier.clone().unwrap_or_default(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            "classification gap".to_string(),
        ]);
    }
    table(&["requirement", "category", "resources", "shared", "status"], rows)
}

fn print_text(name: Option<&str>, plan: &AssignmentPlan) {
    match name {
        Some(name) => println!("{} Plan for {}", "->".green(), name.cyan()),
        None => println!("{} Plan", "->".green()),
    }
    println!();

    for a in &plan.assignments {
        let ids = a
            .resource_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if a.is_filled() || (a.optional && !plan.unmet.contains(&a.requirement_name)) {
            let shared = if a.shared { " (shared)" } else { "" };
            println!(
                "  {} {} [{}]: {}{}",
                "✓".green(),
                a.requirement_name,
                a.category,
                ids,
                shared
            );
        }
    }
    for name in &plan.unmet {
        println!("  {} {}: unmet", "✗".red(), name);
    }
    for name in &plan.skipped {
        println!("  {} {}: not a typed resource", "-".dimmed(), name);
    }
    for gap in &plan.gaps {
        println!("  {} {}", "Warning".yellow(), gap);
    }

    println!();
    if plan.is_complete() {
        println!("{} Plan is complete", "✓".green());
    } else {
        println!(
            "{} {} mandatory requirement(s) unmet",
            "✗".red(),
            plan.unmet.len()
        );
    }
}
