//! Edge gateway for the certificate console.
//!
//! Browser-facing deployments put this gateway between the console and the
//! certificate backend so the backend never has to care about CORS or
//! same-origin policies. The gateway relays requests verbatim: it forwards
//! the caller's `Authorization` header untouched, passes backend statuses and
//! bodies back unchanged, and never participates in the token refresh
//! protocol. Refresh and retry live entirely in the client
//! (`certdesk-client`); the gateway stays stateless.
//!
//! # Example
//!
//! ```ignore
//! use certdesk_gateway::{Gateway, GatewayConfig};
//!
//! let config = GatewayConfig::new("https://localhost:8443/api")
//!     .with_bind_addr("127.0.0.1:3000".parse()?);
//! Gateway::new(config)?.run().await?;
//! ```

pub mod config;
pub mod error;
mod routes;
mod upstream;

pub use config::GatewayConfig;
pub use error::{ErrorResponse, GatewayError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::upstream::Upstream;

/// Shared state for the gateway.
pub(crate) struct GatewayState {
    pub(crate) upstream: Upstream,
}

/// The edge gateway server.
pub struct Gateway {
    config: GatewayConfig,
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Create a gateway for the configured backend.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let upstream = Upstream::new(&config)?;
        Ok(Self {
            state: Arc::new(GatewayState { upstream }),
            config,
        })
    }

    /// Build the axum router.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(routes::health))
            .nest("/api", self.api_routes())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router
    }

    /// Backend-relay routes, mounted under `/api`.
    fn api_routes(&self) -> Router<Arc<GatewayState>> {
        Router::new()
            .route("/auth/login", post(routes::login))
            .route("/auth/refresh", post(routes::refresh))
            .route("/auth/logout", post(routes::logout))
            .route(
                "/certificates",
                get(routes::list_certificates).post(routes::create_certificate),
            )
            .route(
                "/certificates/type/{kind}",
                get(routes::list_certificates_by_type),
            )
            .route("/certificates/{serial}", get(routes::get_certificate))
            .route(
                "/certificates/{serial}/revoke",
                post(routes::revoke_certificate),
            )
            .route(
                "/certificates/{serial}/download/{format}",
                get(routes::download_certificate),
            )
    }

    /// Run the gateway until the process exits.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, backend = %self.config.backend_url, "Starting gateway");
        axum::serve(listener, self.router()).await
    }

    /// Run the gateway until `shutdown` resolves.
    pub async fn run_until(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, backend = %self.config.backend_url, "Starting gateway");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Run in the background with graceful shutdown, returning the bound
    /// address. Binding happens before this returns, so callers can connect
    /// immediately.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, backend = %self.config.backend_url, "Starting gateway");
        tokio::spawn(async move {
            axum::serve(listener, self.router())
                .with_graceful_shutdown(shutdown)
                .await
                .ok();
        });
        Ok(local_addr)
    }
}
