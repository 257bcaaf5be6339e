//! Collegia webhooks CLI
//!
//! Operator tooling for the webhook pipeline: compute and check body
//! signatures, and send a test delivery to an endpoint.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// Collegia webhooks CLI: sign payloads and probe subscriber endpoints.
#[derive(Parser, Debug)]
#[command(name = "collegia-hooks", version, about)]
struct Cli {
    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the HMAC-SHA256 signature of a body.
    Sign(commands::sign::SignArgs),
    /// Check a signature against a body.
    Verify(commands::verify::VerifyArgs),
    /// Send a test delivery to an endpoint.
    Ping(commands::ping::PingArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Sign(args) => commands::sign::run(&args, &cli.format),
        Command::Verify(args) => commands::verify::run(&args, &cli.format),
        Command::Ping(args) => commands::ping::run(&args, &cli.format).await,
    }
}
