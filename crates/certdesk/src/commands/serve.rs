//! Serve command - runs the edge gateway.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use certdesk_gateway::{Gateway, GatewayConfig};

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the gateway to
    #[arg(short, long, env = "CERTDESK_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Base URL of the certificate backend, including its /api prefix
    #[arg(
        long,
        env = "CERTDESK_BACKEND_URL",
        default_value = "https://localhost:8443/api"
    )]
    pub backend_url: String,

    /// Timeout per upstream request, in seconds
    #[arg(long, env = "CERTDESK_UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Accept self-signed TLS certificates from the backend
    #[arg(long, env = "CERTDESK_INSECURE_BACKEND")]
    pub insecure_backend: bool,

    /// Disable the permissive CORS layer
    #[arg(long, env = "CERTDESK_NO_CORS")]
    pub no_cors: bool,
}

/// Run the serve command.
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = GatewayConfig::new(&args.backend_url)
        .with_bind_addr(args.bind)
        .with_upstream_timeout(Duration::from_secs(args.upstream_timeout_secs))
        .with_insecure_backend(args.insecure_backend)
        .with_cors(!args.no_cors);

    if args.insecure_backend {
        tracing::warn!(backend = %args.backend_url, "backend TLS verification disabled");
    }

    let gateway = Gateway::new(config)?;

    println!("certdesk gateway starting on http://{}", args.bind);
    println!("Relaying to backend at {}", args.backend_url);
    println!("Press Ctrl+C to stop");

    gateway.run_until(shutdown_signal()).await?;
    tracing::info!("gateway stopped");

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(error) => tracing::error!(%error, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
