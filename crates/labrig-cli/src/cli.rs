//! CLI command definitions using clap

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// labrig - plan lab asset assignments against an inventory
#[derive(Parser)]
#[command(name = "labrig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, table)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<OutputFormat>,

    /// Engine configuration file
    #[arg(short = 'c', long, global = true, env = "LABRIG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Plan instance assignments for a protocol without reserving anything
    Plan {
        /// Inventory document (yaml, toml or json)
        #[arg(short, long)]
        inventory: PathBuf,

        /// Protocol requirements document
        #[arg(short, long)]
        protocol: PathBuf,

        /// Let one instance fill several slots of a requirement
        #[arg(long)]
        allow_sharing: bool,

        /// Offer instances that are already in use
        #[arg(long)]
        allow_in_use: bool,

        /// Ignore consumable capacity
        #[arg(long)]
        infinite_consumables: bool,
    },

    /// List consumables at or below a remaining-capacity threshold
    LowStock {
        /// Inventory document (yaml, toml or json)
        #[arg(short, long)]
        inventory: PathBuf,

        /// Threshold; defaults to the configured low_stock_threshold
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Validate and print the engine configuration given with --config
    Config,
}
