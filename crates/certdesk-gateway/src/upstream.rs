//! Relay client for forwarding requests to the certificate backend.

use axum::http::{HeaderValue, Method, header};
use bytes::Bytes;
use reqwest::Client;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};

/// Forwards gateway requests to the backend without reshaping them.
///
/// The gateway never inspects or rewrites credentials: the `Authorization`
/// header of the incoming request is copied onto the upstream request
/// exactly as received, and upstream statuses come back untouched.
#[derive(Debug, Clone)]
pub(crate) struct Upstream {
    client: Client,
    base_url: Url,
    timeout: std::time::Duration,
}

impl Upstream {
    /// Build a relay client from the gateway config.
    pub(crate) fn new(config: &GatewayConfig) -> Result<Self> {
        let mut base = config.backend_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|e| GatewayError::Config(format!("invalid backend URL: {}", e)))?;

        let client = Client::builder()
            .danger_accept_invalid_certs(config.insecure_backend)
            .build()
            .map_err(GatewayError::Upstream)?;

        Ok(Self {
            client,
            base_url,
            timeout: config.upstream_timeout,
        })
    }

    /// Forward one request and return the raw upstream response.
    ///
    /// `path_and_query` is relative to the backend base URL and carries the
    /// original query string when one was present.
    pub(crate) async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        authorization: Option<HeaderValue>,
        content_type: Option<HeaderValue>,
        body: Option<Bytes>,
    ) -> Result<reqwest::Response> {
        let url = self
            .base_url
            .join(path_and_query.trim_start_matches('/'))
            .map_err(|e| GatewayError::Config(format!("invalid upstream path: {}", e)))?;

        tracing::debug!(method = %method, url = %url, "Forwarding to backend");

        let mut request = self.client.request(method, url).timeout(self.timeout);

        if let Some(auth) = authorization {
            request = request.header(header::AUTHORIZATION, auth);
        }
        if let Some(value) = content_type {
            request = request.header(header::CONTENT_TYPE, value);
        }
        if let Some(bytes) = body {
            request = request.body(bytes);
        }

        Ok(request.send().await?)
    }
}
