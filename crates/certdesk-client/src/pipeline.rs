//! The authenticated request pipeline.
//!
//! [`ConsoleClient::execute`] runs a [`RequestDescriptor`] through an ordered
//! set of stages: attach the current access token, submit, classify the
//! response, and on a 401 run at most one refresh-and-retry cycle. Refreshes
//! are single-flight: concurrent 401 observers share one exchange through the
//! credential store's watch channel, because the backend's refresh tokens are
//! single-use and a second concurrent exchange would invalidate the first.

use std::sync::Arc;

use certdesk_types::{AuthResponse, Credential, RefreshRequest};
use reqwest::StatusCode;

use crate::client::{ClientInner, ConsoleClient};
use crate::descriptor::{AuthMode, BackendResponse, RequestDescriptor};
use crate::error::{Error, Result};
use crate::store::{RefreshSignal, RefreshTicket};

impl ConsoleClient {
    /// Execute a request descriptor against the backend.
    ///
    /// Returns the backend's response verbatim, success or not, with two
    /// exceptions: a 401 on a [`AuthMode::Bearer`] descriptor is recovered
    /// once via refresh-and-retry, and a 401 that survives a successful
    /// refresh is terminal: the store is cleared and the caller gets
    /// [`Error::Reauthenticate`]. Network-level failures surface as
    /// [`Error::Transport`] and are never retried here.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<BackendResponse> {
        // Retry budget local to this call, spent by at most one refresh.
        let mut refreshed = false;

        loop {
            let token = match descriptor.auth_mode() {
                AuthMode::Anonymous => None,
                AuthMode::Bearer | AuthMode::BearerNoRefresh => {
                    let credential = self
                        .inner()
                        .store
                        .get()
                        .await
                        .ok_or(Error::Unauthenticated)?;
                    Some(credential.access_token)
                }
            };

            let response = self.submit(descriptor, token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED
                || descriptor.auth_mode() != AuthMode::Bearer
            {
                return Ok(response);
            }

            if refreshed {
                // The freshly refreshed token was rejected too. Ending the
                // session here keeps callers from looping on credentials the
                // backend no longer honors.
                tracing::warn!(
                    path = descriptor.path(),
                    "401 after successful refresh, session terminated"
                );
                self.inner().store.clear().await;
                return Err(Error::Reauthenticate);
            }

            tracing::debug!(path = descriptor.path(), "access token rejected, refreshing");
            self.refresh_credential().await?;
            refreshed = true;
        }
    }

    /// Submit one attempt. Each attempt gets a fresh timeout budget.
    async fn submit(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<BackendResponse> {
        let inner = self.inner();
        let url = inner.url(descriptor.path())?;

        let mut request = inner
            .http
            .request(descriptor.method().clone(), url)
            .headers(descriptor.headers().clone())
            .timeout(inner.session.timeout);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = descriptor.body_bytes() {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(BackendResponse::new(status, headers, body))
    }

    /// Join or start the single in-flight refresh and wait for its outcome.
    ///
    /// The leader runs the exchange on a spawned task so that cancelling the
    /// request that happened to claim leadership cannot abort a refresh other
    /// waiters depend on; the leader then waits on the same watch channel as
    /// everyone else.
    async fn refresh_credential(&self) -> Result<()> {
        let mut signal = match self.inner().store.join_refresh().await {
            RefreshTicket::Lead {
                refresh_token,
                epoch,
                signal,
            } => {
                let inner = Arc::clone(self.inner());
                tokio::spawn(async move {
                    let outcome = refresh_exchange(&inner, refresh_token).await;
                    inner.store.settle_refresh(epoch, outcome).await;
                });
                signal
            }
            RefreshTicket::Wait { signal } => signal,
            // The credential vanished between the 401 and this point
            // (concurrent logout). The session is already torn down.
            RefreshTicket::Empty => return Err(Error::Reauthenticate),
        };

        let outcome = signal
            .wait_for(|signal| *signal != RefreshSignal::Pending)
            .await
            .map(|signal| (*signal).clone());

        match outcome {
            Ok(RefreshSignal::Refreshed) => Ok(()),
            // Reauthenticate, or the channel closed without settling.
            _ => Err(Error::Reauthenticate),
        }
    }
}

/// Run the refresh exchange itself.
///
/// This is a plain anonymous POST, deliberately outside [`ConsoleClient::execute`]
/// so a rejected refresh can never recurse into another refresh. Every failure
/// mode maps to `None`; the store decides whether that ends the session.
async fn refresh_exchange(inner: &ClientInner, refresh_token: String) -> Option<Credential> {
    let url = match inner.url("auth/refresh") {
        Ok(url) => url,
        Err(error) => {
            tracing::warn!(%error, "refresh URL did not parse");
            return None;
        }
    };

    let result = inner
        .http
        .post(url)
        .timeout(inner.session.timeout)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(%error, "refresh exchange unreachable");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, body, "refresh token rejected");
        return None;
    }

    match response.json::<AuthResponse>().await {
        Ok(auth) => Some(Credential::issue(
            auth,
            inner.session.access_token_ttl_secs,
            inner.session.refresh_token_ttl_secs,
        )),
        Err(error) => {
            tracing::warn!(%error, "refresh response did not decode");
            None
        }
    }
}
