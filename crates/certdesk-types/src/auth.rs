//! Authentication wire types and the in-memory session credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful response from `POST /auth/login` and `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"` from the current backend.
    pub token_type: String,
    pub username: String,
}

/// The active session credential.
///
/// Zero or one of these exists per session. It is replaced wholesale on
/// refresh and destroyed on logout or terminal auth failure, never
/// field-merged. The backend does not report token lifetimes, so the expiry
/// timestamps are stamped from configured TTLs when the credential is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub username: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a completed auth exchange.
    pub fn issue(response: AuthResponse, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self::issue_at(response, access_ttl_secs, refresh_ttl_secs, Utc::now())
    }

    /// Like [`Credential::issue`] with an explicit issue instant.
    pub fn issue_at(
        response: AuthResponse,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            username: response.username,
            access_expires_at: now + Duration::seconds(access_ttl_secs as i64),
            refresh_expires_at: now + Duration::seconds(refresh_ttl_secs as i64),
        }
    }

    /// Whether the access token is past its derived expiry.
    ///
    /// The request pipeline never consults this (it reacts to 401s instead);
    /// UI layers use it to render session state.
    pub fn access_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.access_expires_at
    }

    /// Whether the refresh token is past its derived expiry.
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> AuthResponse {
        AuthResponse {
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
            token_type: "Bearer".into(),
            username: "admin".into(),
        }
    }

    #[test]
    fn test_auth_response_uses_backend_field_names() {
        let parsed: AuthResponse = serde_json::from_str(
            r#"{"accessToken":"a","refreshToken":"r","tokenType":"Bearer","username":"admin"}"#,
        )
        .unwrap();
        assert_eq!(parsed.access_token, "a");
        assert_eq!(parsed.refresh_token, "r");
        assert_eq!(parsed.token_type, "Bearer");
    }

    #[test]
    fn test_refresh_request_serializes_camel_case() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "r".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"refreshToken": "r"}));
    }

    #[test]
    fn test_issue_stamps_expiries_from_ttls() {
        let now = Utc::now();
        let credential = Credential::issue_at(response(), 3600, 604_800, now);
        assert_eq!(credential.access_expires_at, now + Duration::seconds(3600));
        assert_eq!(
            credential.refresh_expires_at,
            now + Duration::seconds(604_800)
        );
        assert!(!credential.access_expired(now));
        assert!(credential.access_expired(now + Duration::seconds(3601)));
        assert!(!credential.refresh_expired(now + Duration::seconds(3601)));
    }
}
