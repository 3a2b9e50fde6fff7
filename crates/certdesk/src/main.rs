//! certdesk - edge gateway for the certificate console.
//!
//! Main entry point for the certdesk CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::serve;

/// certdesk - edge gateway for the certificate console
#[derive(Parser)]
#[command(name = "certdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the edge gateway in the foreground
    Serve(serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console layer for humans, rotating JSON file for retention.
    let filter = if cli.verbose {
        "certdesk=debug,certdesk_gateway=debug,certdesk_client=debug,info"
    } else {
        "certdesk=info,certdesk_gateway=info,certdesk_client=info,warn"
    };

    let file_appender = tracing_appender::rolling::daily(log_dir(), "certdesk.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "certdesk=trace,certdesk_gateway=trace,certdesk_client=trace,info",
                )),
        )
        .init();

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
    }
}

/// Directory for rotating log files.
///
/// `$CERTDESK_LOG_DIR` wins, then the platform config dir, then `./logs`.
fn log_dir() -> PathBuf {
    match std::env::var("CERTDESK_LOG_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .map(|d| d.join("certdesk").join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs")),
    }
}
