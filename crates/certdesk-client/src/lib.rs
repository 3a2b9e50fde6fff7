//! HTTP client SDK for the certdesk certificate console.
//!
//! This crate owns the session core of the console: the credential store and
//! the authenticated request pipeline, plus a typed SDK over the backend's
//! auth and certificate endpoints.
//!
//! The pipeline attaches the session's bearer token to every outgoing call,
//! detects a 401, transparently refreshes the credential, and retries the
//! original request exactly once. Refreshes are single-flight across
//! concurrent callers: however many requests observe a 401 at once, the
//! backend sees one `POST /auth/refresh`, and every caller retries with the
//! one new token pair. A refresh that fails ends the session: the store is
//! cleared and callers get [`Error::Reauthenticate`], their cue to send the
//! user back to login.
//!
//! # Example
//!
//! ```no_run
//! use certdesk_client::ConsoleClient;
//! use certdesk_client::types::{BundleFormat, CertificateType};
//!
//! # async fn example() -> certdesk_client::Result<()> {
//! let client = ConsoleClient::builder()
//!     .base_url("https://localhost:8443/api")
//!     .accept_invalid_certs(true) // self-signed dev backend
//!     .build()?;
//!
//! client.auth().login("admin", "secret").await?;
//!
//! // Expired access tokens are refreshed and retried behind this call.
//! for cert in client.certificates().list().await? {
//!     println!("{} ({})", cert.common_name, cert.serial_number);
//! }
//!
//! let roots = client
//!     .certificates()
//!     .list_by_type(CertificateType::SelfSignedRoot)
//!     .await?;
//! if let Some(root) = roots.first() {
//!     let bundle = client
//!         .certificates()
//!         .download(&root.serial_number, BundleFormat::Pkcs12)
//!         .await?;
//!     println!("downloaded {} ({} bytes)", bundle.filename, bundle.bytes.len());
//! }
//!
//! client.auth().logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod descriptor;
pub mod error;

mod pipeline;
mod store;

pub use api::{AuthApi, CertificateBundle, CertificatesApi};
pub use client::{ClientBuilder, ConsoleClient, SessionConfig};
pub use descriptor::{AuthMode, BackendResponse, RequestDescriptor};
pub use error::{Error, Result};

/// Re-export of the shared wire types.
pub use certdesk_types as types;
