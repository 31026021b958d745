//! # Stockroom CLI
//!
//! Terminal client for the Stockroom API.
//!
//! ```text
//! stockroom products list|show|add|edit|delete
//! stockroom scan [--source scanner] [--adjust N]
//! stockroom logs    [--action] [--source] [--name] [--sku] [--start] [--end]
//!                   [--sort] [--order] [--page] [--csv product_logs.csv]
//! stockroom history [--today] [--source] [--name] [--sku] [--start] [--end]
//!                   [--sort] [--order] [--page] [--csv scan_log.csv]
//! ```

mod args;
mod client;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command};
use crate::client::{ApiClient, ClientError};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let retryable = err
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_retryable);
            if retryable {
                ExitCode::from(75) // EX_TEMPFAIL
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = ApiClient::new(&cli.api_url)?;

    match cli.command {
        Command::Products(command) => commands::products::run(&client, command).await,
        Command::Scan(args) => commands::scan::run(&client, args).await,
        Command::Logs(args) => commands::logs::run_product_logs(&client, args).await,
        Command::History(args) => commands::logs::run_scan_history(&client, args).await,
    }
}
