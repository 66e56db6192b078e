//! Metacat CLI Binary
//!
//! Command-line interface for building and updating a metadata catalog.

use anyhow::Context;
use clap::Parser;
use metacat::config::ConfigLoader;
use metacat::logging::init_catalog_logging;
use metacat::tooling::cli::{render_error, Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Error initializing logging: {:#}", e);
        process::exit(1);
    }

    let context = match CliContext::new(cli.catalog.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error opening catalog: {}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            println!("{}", render_error(&cli.command, &e));
            process::exit(1);
        }
    }
}

/// Logging settings come from the catalog config, with command-line flags on top.
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_with_file(&cli.catalog, path),
        None => ConfigLoader::load(&cli.catalog),
    }
    .context("loading configuration")?;
    let logging = cli.logging_config(&config.logging);
    init_catalog_logging(Some(&logging), Some(&cli.catalog)).context("installing log subscriber")?;
    Ok(())
}
