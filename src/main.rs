//! streak-tracker: a PIN-protected habit streak tracker for the terminal.
//!
//! Days are marked green (done) or red (skipped) per habit; the tool reports
//! current and longest streaks and moves marks in and out as CSV.

mod app;
mod cli;
mod data;
mod error;
mod repository;
mod stats;
mod transfer;

use anyhow::Result;
use cli::{AppConfig, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so command output on stdout stays pipeable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "streak=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse_args();
    let config = AppConfig::from_args(cli.db_path, cli.pin);

    app::run(config, cli.command)
}
