//! Entry point for otto, a streaming tool-calling coding agent for the terminal.
//!
//! This binary loads environment variables, installs the log subscriber,
//! parses CLI arguments via [`cli`], and dispatches to the chosen handler.

mod accumulator;
mod agent;
mod chat;
mod cli;
mod config;
mod constants;
mod feedback;
mod message;
mod output;
mod prompts;
mod provider;
mod tools;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Runs the otto CLI.
///
/// Loads `.env` files (silently ignored if absent), routes `tracing` output
/// to stderr filtered by `RUST_LOG`, parses command-line arguments into a
/// [`cli::Cli`] struct, and dispatches via [`cli::run`].
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::parse();
    cli::run(cli).await
}
