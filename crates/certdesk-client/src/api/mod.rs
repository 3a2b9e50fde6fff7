//! Typed API groups over the request pipeline.

mod auth;
mod certificates;

pub use auth::AuthApi;
pub use certificates::{CertificateBundle, CertificatesApi};
