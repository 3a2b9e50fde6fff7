//! In-memory credential store with single-flight refresh coalescing.
//!
//! One mutex guards the credential, its epoch, and the in-flight refresh
//! marker, so "is a refresh already running" is decided atomically with
//! credential reads and writes. The lock is only ever held for state
//! transitions, never across network I/O.

use certdesk_types::Credential;
use tokio::sync::{Mutex, watch};

/// Broadcast to every caller waiting on an in-flight refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RefreshSignal {
    /// The refresh exchange has not settled yet.
    Pending,
    /// A usable credential is in the store; retry the original request.
    Refreshed,
    /// Terminal failure; the session is over.
    Reauthenticate,
}

/// What a 401-observing caller gets back from [`CredentialStore::join_refresh`].
#[derive(Debug)]
pub(crate) enum RefreshTicket {
    /// This caller claimed the refresh. It must run the exchange and call
    /// [`CredentialStore::settle_refresh`] exactly once with the claim epoch,
    /// then wait on `signal` like everyone else.
    Lead {
        refresh_token: String,
        epoch: u64,
        signal: watch::Receiver<RefreshSignal>,
    },
    /// Another caller is already refreshing; wait on its signal.
    Wait {
        signal: watch::Receiver<RefreshSignal>,
    },
    /// No credential to refresh with.
    Empty,
}

#[derive(Debug, Default)]
struct StoreState {
    credential: Option<Credential>,
    /// Bumped on every credential replace or clear. A refresh claim records
    /// the epoch it saw; settling against a moved epoch discards the result.
    epoch: u64,
    refresh: Option<watch::Sender<RefreshSignal>>,
}

/// Holds zero or one [`Credential`] per client.
///
/// Starts empty. Only login success, refresh success, logout, and terminal
/// refresh failure mutate it, and each replaces or removes the record
/// wholesale.
#[derive(Debug, Default)]
pub(crate) struct CredentialStore {
    state: Mutex<StoreState>,
}

impl CredentialStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current credential, if any.
    pub(crate) async fn get(&self) -> Option<Credential> {
        self.state.lock().await.credential.clone()
    }

    /// Replace the credential wholesale.
    pub(crate) async fn set(&self, credential: Credential) {
        let mut state = self.state.lock().await;
        tracing::debug!(username = %credential.username, "credential installed");
        state.credential = Some(credential);
        state.epoch += 1;
    }

    /// Remove the credential. Idempotent.
    pub(crate) async fn clear(&self) {
        let mut state = self.state.lock().await;
        if state.credential.take().is_some() {
            state.epoch += 1;
            tracing::debug!("credential cleared");
        }
    }

    /// Atomically join the in-flight refresh or claim leadership of a new one.
    ///
    /// The check for an existing refresh and the creation of a new marker
    /// happen under one lock acquisition, so concurrent 401 observers can
    /// never start two exchanges.
    pub(crate) async fn join_refresh(&self) -> RefreshTicket {
        let mut state = self.state.lock().await;

        if let Some(sender) = &state.refresh {
            return RefreshTicket::Wait {
                signal: sender.subscribe(),
            };
        }

        let Some(credential) = &state.credential else {
            return RefreshTicket::Empty;
        };

        let (sender, signal) = watch::channel(RefreshSignal::Pending);
        let refresh_token = credential.refresh_token.clone();
        let epoch = state.epoch;
        state.refresh = Some(sender);
        tracing::debug!(epoch, "refresh claimed");

        RefreshTicket::Lead {
            refresh_token,
            epoch,
            signal,
        }
    }

    /// Settle the claimed refresh: apply or discard the outcome and wake every
    /// waiter. Called exactly once per `Lead` ticket.
    ///
    /// `claim_epoch` is compared against the current epoch to detect a logout
    /// or login that raced the exchange; a moved epoch means the store owns a
    /// newer truth and the refresh result is discarded.
    pub(crate) async fn settle_refresh(&self, claim_epoch: u64, outcome: Option<Credential>) {
        let mut state = self.state.lock().await;
        let Some(sender) = state.refresh.take() else {
            return;
        };

        let signal = match outcome {
            Some(credential) if state.epoch == claim_epoch => {
                state.credential = Some(credential);
                state.epoch += 1;
                tracing::debug!("credential refreshed");
                RefreshSignal::Refreshed
            }
            None if state.epoch == claim_epoch => {
                state.credential = None;
                state.epoch += 1;
                tracing::warn!("credential refresh failed, session terminated");
                RefreshSignal::Reauthenticate
            }
            // The epoch moved: a login or logout raced the exchange, and the
            // outcome, success or failure, belongs to the old session.
            _ => {
                if state.credential.is_some() {
                    // A login installed a newer credential. Waiters retry
                    // with it.
                    tracing::debug!("refresh outcome discarded, login credential kept");
                    RefreshSignal::Refreshed
                } else {
                    tracing::debug!("refresh outcome discarded after logout");
                    RefreshSignal::Reauthenticate
                }
            }
        };

        let _ = sender.send(signal);
    }
}
