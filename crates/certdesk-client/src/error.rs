//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure (DNS, connect, TLS, timeout). Never retried here.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No credential in the store for a request that needs one.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Terminal authentication failure. The credential store has already been
    /// cleared; the caller must send the user back through login.
    #[error("Session expired, re-authentication required")]
    Reauthenticate,

    /// The backend answered with a non-success status.
    #[error("Backend error ({status}): {body}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Raw error payload, JSON or plain text.
        body: String,
    },

    /// A response body did not decode as the expected type.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request was rejected client-side before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this error means the user must log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::Unauthenticated | Error::Reauthenticate)
    }

    /// Check if this is a backend not-found response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Backend { status: 404, .. })
    }

    /// Check if this is a network-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Backend status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
