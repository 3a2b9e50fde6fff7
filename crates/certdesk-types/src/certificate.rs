//! Certificate wire types.
//!
//! Field names and enum spellings match the backend's JSON exactly. Timestamps
//! come over the wire without a zone offset, so they are [`NaiveDateTime`]s.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A string that did not name a known enum value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {what}: {value}")]
pub struct UnknownValue {
    pub what: &'static str,
    pub value: String,
}

/// Certificate kind, as the backend spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateType {
    SelfSignedRoot,
    Intermediate,
    EndEntity,
}

impl CertificateType {
    /// Wire spelling, also used as the `/certificates/type/{kind}` path segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::SelfSignedRoot => "SELF_SIGNED_ROOT",
            CertificateType::Intermediate => "INTERMEDIATE",
            CertificateType::EndEntity => "END_ENTITY",
        }
    }

    /// Whether certificates of this kind are signed by another certificate.
    pub fn requires_issuer(&self) -> bool {
        !matches!(self, CertificateType::SelfSignedRoot)
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SELF_SIGNED_ROOT" => Ok(CertificateType::SelfSignedRoot),
            "INTERMEDIATE" => Ok(CertificateType::Intermediate),
            "END_ENTITY" => Ok(CertificateType::EndEntity),
            other => Err(UnknownValue {
                what: "certificate type",
                value: other.to_string(),
            }),
        }
    }
}

/// A certificate as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: i64,
    pub common_name: String,
    pub organization: String,
    pub organizational_unit: String,
    pub country: String,
    pub state: String,
    pub locality: String,
    pub serial_number: String,
    #[serde(rename = "type")]
    pub kind: CertificateType,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked: bool,
    #[serde(default)]
    pub revoked_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub issuer_serial_number: Option<String>,
    /// PEM-encoded certificate body. Opaque to this console.
    pub certificate_data: String,
}

/// Body of `POST /certificates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequest {
    pub common_name: String,
    pub organization: String,
    pub organizational_unit: String,
    pub country: String,
    pub state: String,
    pub locality: String,
    #[serde(rename = "type")]
    pub kind: CertificateType,
    pub validity_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_serial_number: Option<String>,
}

/// Reasons a [`CertificateRequest`] would be rejected by the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCertificateRequest {
    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("validityYears must be at least 1")]
    NonPositiveValidity,

    #[error("issuerSerialNumber is required for {kind} certificates")]
    MissingIssuer { kind: CertificateType },
}

impl CertificateRequest {
    /// Check the request against the backend's acceptance rules.
    ///
    /// Mirrors the server side: subject fields must be non-blank, validity is
    /// at least one year, and anything other than a self-signed root names its
    /// issuer.
    pub fn validate(&self) -> Result<(), InvalidCertificateRequest> {
        let subject = [
            ("commonName", &self.common_name),
            ("organization", &self.organization),
            ("organizationalUnit", &self.organizational_unit),
            ("country", &self.country),
            ("state", &self.state),
            ("locality", &self.locality),
        ];
        for (name, value) in subject {
            if value.trim().is_empty() {
                return Err(InvalidCertificateRequest::Blank(name));
            }
        }

        if self.validity_years == 0 {
            return Err(InvalidCertificateRequest::NonPositiveValidity);
        }

        if self.kind.requires_issuer()
            && self
                .issuer_serial_number
                .as_deref()
                .is_none_or(|s| s.trim().is_empty())
        {
            return Err(InvalidCertificateRequest::MissingIssuer { kind: self.kind });
        }

        Ok(())
    }
}

/// Keystore format for certificate bundle downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleFormat {
    Pkcs12,
    Jks,
}

impl BundleFormat {
    /// The `/download/{format}` path segment the backend expects.
    pub fn path_segment(&self) -> &'static str {
        match self {
            BundleFormat::Pkcs12 => "PKCS12",
            BundleFormat::Jks => "JKS",
        }
    }

    /// File extension the backend uses in its attachment filename.
    pub fn extension(&self) -> &'static str {
        match self {
            BundleFormat::Pkcs12 => "p12",
            BundleFormat::Jks => "jks",
        }
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for BundleFormat {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PKCS12" | "P12" => Ok(BundleFormat::Pkcs12),
            "JKS" => Ok(BundleFormat::Jks),
            other => Err(UnknownValue {
                what: "bundle format",
                value: other.to_string(),
            }),
        }
    }
}

/// Outcome of a revoke call, as the console surfaces it.
///
/// The backend answers revocations with a plain-text message; the gateway
/// wraps that text as `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevokeReceipt {
    pub message: String,
}
