//! Stratacache - command-line access to a tiered key/value cache
//!
//! Builds the cache stack from a JSON configuration file (or the per-user cache
//! directory by default) and runs one operation against it.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stratacache::cache::Cache;
use stratacache::cli::{execute, Cli, CliError};

/// Sends log output to stderr, honouring `RUST_LOG` when set
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stratacache={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<bool, CliError> {
    let cache = cli.stack_config()?.build()?;
    if !cache.available() {
        tracing::warn!("not every cache tier is available");
    }

    let outcome = execute(&cache, &cli.command)?;
    if let Some(output) = outcome.output {
        println!("{}", output);
    }
    Ok(outcome.success)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
