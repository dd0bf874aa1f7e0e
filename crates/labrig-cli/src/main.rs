//! labrig CLI - plan lab asset assignments and inspect consumable stock

mod cli;
mod commands;
mod documents;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use labrig_kernel::PlanOptions;

pub use error::CliError;

/// Exit code of `labrig plan` when a mandatory requirement is unmet.
const EXIT_UNMET: i32 = 2;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.output.unwrap_or_default();

    match cli.command {
        Commands::Plan {
            inventory,
            protocol,
            allow_sharing,
            allow_in_use,
            infinite_consumables,
        } => {
            let config = commands::load_engine_config(cli.config.as_deref())?;
            let flags = PlanOptions::new()
                .with_allow_sharing(allow_sharing)
                .with_allow_in_use(allow_in_use)
                .with_infinite_consumables(infinite_consumables);
            let complete = commands::plan::run(&inventory, &protocol, flags, config, format)?;
            if !complete {
                std::process::exit(EXIT_UNMET);
            }
        }

        Commands::LowStock {
            inventory,
            threshold,
        } => {
            let config = commands::load_engine_config(cli.config.as_deref())?;
            commands::low_stock::run(&inventory, threshold, config, format)?;
        }

        Commands::Config => {
            commands::config_cmd::run(cli.config.as_deref(), format)?;
        }
    }

    Ok(())
}
