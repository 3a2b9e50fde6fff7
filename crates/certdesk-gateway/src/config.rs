//! Gateway configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default timeout for upstream requests.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the edge gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to bind the gateway to.
    pub bind_addr: SocketAddr,

    /// Base URL of the certificate backend, including its `/api` prefix.
    pub backend_url: String,

    /// Timeout per upstream request.
    pub upstream_timeout: Duration,

    /// Accept self-signed TLS certificates from the backend (development
    /// backends serve their own PKI's certificates before any root is
    /// trusted).
    pub insecure_backend: bool,

    /// Allow any browser origin (the console is browser-facing).
    pub enable_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            backend_url: "https://localhost:8443/api".to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            insecure_backend: false,
            enable_cors: true,
        }
    }
}

impl GatewayConfig {
    /// Create a config pointing at a backend URL.
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            ..Default::default()
        }
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the upstream request timeout.
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Accept or reject self-signed backend certificates.
    pub fn with_insecure_backend(mut self, insecure: bool) -> Self {
        self.insecure_backend = insecure;
        self
    }

    /// Enable or disable permissive CORS.
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.enable_cors = enabled;
        self
    }
}
