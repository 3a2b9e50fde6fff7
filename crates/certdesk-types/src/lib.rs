//! Shared wire types for the certdesk console.
//!
//! Everything here mirrors the certificate backend's JSON contract (camelCase
//! field names, `SCREAMING_SNAKE_CASE` certificate types) and carries no I/O
//! of its own. The client SDK and the gateway tests both build on these.

pub mod auth;
pub mod certificate;

pub use auth::{AuthResponse, Credential, LoginRequest, RefreshRequest};
pub use certificate::{
    BundleFormat, Certificate, CertificateRequest, CertificateType, InvalidCertificateRequest,
    RevokeReceipt, UnknownValue,
};
