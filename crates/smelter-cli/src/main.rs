//! Smelter CLI - table extraction and cleaning for messy spreadsheet exports.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Info { file, json } => commands::info::run(file, json, cli.verbose),

        Commands::Clean {
            file,
            output,
            format,
            force,
            no_quality_report,
            include_filters,
            strict,
            config,
            all_tables,
        } => commands::clean::run(
            file,
            output,
            format,
            force,
            no_quality_report,
            include_filters,
            strict,
            config,
            all_tables,
            cli.verbose,
        ),

        Commands::Batch {
            dir,
            workers,
            pattern,
            output_dir,
            format,
            config,
        } => commands::batch::run(
            dir,
            workers,
            pattern,
            output_dir,
            format,
            config,
            cli.verbose,
        ),

        Commands::Version => {
            println!("smelter {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
