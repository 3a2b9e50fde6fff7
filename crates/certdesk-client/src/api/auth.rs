//! Authentication API: login, logout, and session accessors.

use certdesk_types::{AuthResponse, Credential, LoginRequest};

use crate::client::ConsoleClient;
use crate::descriptor::{AuthMode, RequestDescriptor};
use crate::error::Result;

/// Authentication API client.
pub struct AuthApi {
    client: ConsoleClient,
}

impl AuthApi {
    pub(crate) fn new(client: ConsoleClient) -> Self {
        Self { client }
    }

    /// Exchange a username and password for a session credential.
    ///
    /// On success the credential is installed in the store, replacing any
    /// previous session wholesale.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential> {
        let descriptor = RequestDescriptor::post("auth/login")
            .json(&LoginRequest::new(username, password))?
            .auth(AuthMode::Anonymous);

        let response = self.client.execute(&descriptor).await?.into_result()?;
        let auth: AuthResponse = response.json()?;

        let session = self.client.session();
        let credential = Credential::issue(
            auth,
            session.access_token_ttl_secs,
            session.refresh_token_ttl_secs,
        );
        self.client.inner().store.set(credential.clone()).await;
        tracing::info!(username = %credential.username, "logged in");

        Ok(credential)
    }

    /// End the session.
    ///
    /// Tells the backend best-effort and always clears the local credential;
    /// a backend error or unreachable backend never keeps the user logged in.
    /// The logout call itself is never refreshed; an expired access token on
    /// the way out is not worth recovering.
    pub async fn logout(&self) -> Result<()> {
        let descriptor = RequestDescriptor::post("auth/logout").auth(AuthMode::BearerNoRefresh);

        match self.client.execute(&descriptor).await {
            Ok(response) if !response.is_success() => {
                tracing::debug!(status = %response.status(), "backend logout rejected, ignored");
            }
            Err(error) => {
                tracing::debug!(%error, "backend logout failed, ignored");
            }
            Ok(_) => {}
        }

        self.client.inner().store.clear().await;
        tracing::info!("logged out");
        Ok(())
    }

    /// The active credential, if any.
    pub async fn credential(&self) -> Option<Credential> {
        self.client.inner().store.get().await
    }

    /// Username of the active session, if any.
    pub async fn username(&self) -> Option<String> {
        self.credential().await.map(|c| c.username)
    }

    /// Whether a credential is currently installed.
    pub async fn is_authenticated(&self) -> bool {
        self.credential().await.is_some()
    }
}
