//! GeoCRS CLI - Command-line interface
//!
//! Thin adapter over the registry, the transformation factory and the point
//! fitter.

mod cli;
mod commands;
mod config_loader;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;

fn main() {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Errors are already reported by the output writer
    if commands::execute(cli).is_err() {
        std::process::exit(1);
    }
}
