//! flatrepo CLI Binary
//!
//! Command-line interface for the flat repository adapter.

use anyhow::Context;
use clap::Parser;
use flatrepo::config::{ConfigLoader, RepoConfig};
use flatrepo::logging::init_logging;
use flatrepo::tooling::cli::{Cli, CliContext};
use std::process;

fn load_config(cli: &Cli) -> anyhow::Result<RepoConfig> {
    let mut config = ConfigLoader::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;
    cli.apply_overrides(&mut config);
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let context = match CliContext::new(&config, cli.format) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
