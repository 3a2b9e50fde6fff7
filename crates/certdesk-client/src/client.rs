//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::api::{AuthApi, CertificatesApi};
use crate::error::{Error, Result};
use crate::store::CredentialStore;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default access token lifetime (1 hour), used to stamp credential expiry.
const DEFAULT_ACCESS_TTL_SECS: u64 = 3600;

/// Default refresh token lifetime (7 days).
const DEFAULT_REFRESH_TTL_SECS: u64 = 604_800;

/// Session tuning for the credential lifecycle.
///
/// The backend does not report token lifetimes, so these TTLs decide the
/// expiry timestamps stamped onto each issued [`Credential`]. The pipeline
/// itself reacts to 401s rather than watching the clock; the TTLs exist for
/// UI layers that render session state.
///
/// [`Credential`]: certdesk_types::Credential
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime stamped onto access tokens, in seconds.
    pub access_token_ttl_secs: u64,
    /// Lifetime stamped onto refresh tokens, in seconds.
    pub refresh_token_ttl_secs: u64,
    /// Per-attempt request timeout. A retried request gets a fresh budget.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Set the access token TTL in seconds.
    pub fn with_access_token_ttl_secs(mut self, secs: u64) -> Self {
        self.access_token_ttl_secs = secs;
        self
    }

    /// Set the refresh token TTL in seconds.
    pub fn with_refresh_token_ttl_secs(mut self, secs: u64) -> Self {
        self.refresh_token_ttl_secs = secs;
        self
    }

    /// Set the per-attempt request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Certdesk console client.
///
/// Wraps every backend call in the authenticated request pipeline: bearer
/// attachment, 401 detection, single-flight refresh, and at most one retry
/// per request. Clones share one credential store.
///
/// # Example
///
/// ```no_run
/// use certdesk_client::ConsoleClient;
///
/// # async fn example() -> certdesk_client::Result<()> {
/// let client = ConsoleClient::builder()
///     .base_url("https://localhost:8443/api")
///     .build()?;
///
/// client.auth().login("admin", "secret").await?;
/// let certificates = client.certificates().list().await?;
/// println!("{} certificates", certificates.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConsoleClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for backend requests.
    pub(crate) base_url: Url,
    /// Credential TTLs and request timeout.
    pub(crate) session: SessionConfig,
    /// The one credential store behind this client and all its clones.
    pub(crate) store: CredentialStore,
}

impl ClientInner {
    /// Build a URL for a backend path (which may carry a query string).
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::from)
    }
}

impl ConsoleClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get access to the inner client state (for the pipeline and APIs).
    pub(crate) fn inner(&self) -> &Arc<ClientInner> {
        &self.inner
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the session configuration.
    pub fn session(&self) -> &SessionConfig {
        &self.inner.session
    }

    /// Access the authentication API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the certificates API.
    pub fn certificates(&self) -> CertificatesApi {
        CertificatesApi::new(self.clone())
    }
}

/// Builder for creating a [`ConsoleClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    session: SessionConfig,
    user_agent: Option<String>,
    accept_invalid_certs: bool,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            session: SessionConfig::default(),
            user_agent: None,
            accept_invalid_certs: false,
        }
    }

    /// Set the backend base URL (for example `https://localhost:8443/api`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.session.timeout = timeout;
        self
    }

    /// Set the access token TTL in seconds.
    pub fn access_token_ttl_secs(mut self, secs: u64) -> Self {
        self.session.access_token_ttl_secs = secs;
        self
    }

    /// Set the refresh token TTL in seconds.
    pub fn refresh_token_ttl_secs(mut self, secs: u64) -> Self {
        self.session.refresh_token_ttl_secs = secs;
        self
    }

    /// Replace the whole session configuration.
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Accept self-signed backend TLS certificates (development backends).
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ConsoleClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("certdesk-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        Ok(ConsoleClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                session: self.session,
                store: CredentialStore::new(),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
