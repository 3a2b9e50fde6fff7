//! Certificates API: list, create, revoke, download.

use bytes::Bytes;
use certdesk_types::{
    BundleFormat, Certificate, CertificateRequest, CertificateType, RevokeReceipt,
};

use crate::client::ConsoleClient;
use crate::descriptor::RequestDescriptor;
use crate::error::{Error, Result};

/// A downloaded certificate bundle (PKCS12 or JKS keystore).
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    /// Raw keystore bytes.
    pub bytes: Bytes,
    /// Content type reported by the backend.
    pub content_type: String,
    /// Filename from `Content-Disposition`, or a derived default.
    pub filename: String,
}

/// Certificates API client.
pub struct CertificatesApi {
    client: ConsoleClient,
}

impl CertificatesApi {
    pub(crate) fn new(client: ConsoleClient) -> Self {
        Self { client }
    }

    /// List all certificates.
    pub async fn list(&self) -> Result<Vec<Certificate>> {
        self.client
            .execute(&RequestDescriptor::get("certificates"))
            .await?
            .into_result()?
            .json()
    }

    /// List certificates of one kind.
    pub async fn list_by_type(&self, kind: CertificateType) -> Result<Vec<Certificate>> {
        let descriptor = RequestDescriptor::get(format!("certificates/type/{}", kind.as_str()));
        self.client
            .execute(&descriptor)
            .await?
            .into_result()?
            .json()
    }

    /// Fetch one certificate by serial number.
    pub async fn get(&self, serial: &str) -> Result<Certificate> {
        let descriptor = RequestDescriptor::get(format!("certificates/{serial}"));
        self.client
            .execute(&descriptor)
            .await?
            .into_result()?
            .json()
    }

    /// Issue a new certificate.
    ///
    /// The request is validated client-side first, so a request the backend
    /// would reject never leaves the console.
    pub async fn create(&self, request: &CertificateRequest) -> Result<Certificate> {
        request
            .validate()
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;

        let descriptor = RequestDescriptor::post("certificates").json(request)?;
        self.client
            .execute(&descriptor)
            .await?
            .into_result()?
            .json()
    }

    /// Revoke a certificate.
    ///
    /// The backend answers with plain text; the gateway wraps it as
    /// `{"message": ...}`. Both shapes decode to a [`RevokeReceipt`].
    pub async fn revoke(&self, serial: &str) -> Result<RevokeReceipt> {
        let descriptor = RequestDescriptor::post(format!("certificates/{serial}/revoke"));
        let response = self.client.execute(&descriptor).await?.into_result()?;

        Ok(response.json().unwrap_or_else(|_| {
            let text = response.text();
            RevokeReceipt {
                message: if text.trim().is_empty() {
                    "Certificate revoked successfully".to_string()
                } else {
                    text
                },
            }
        }))
    }

    /// Download a certificate's keystore bundle.
    pub async fn download(&self, serial: &str, format: BundleFormat) -> Result<CertificateBundle> {
        let descriptor = RequestDescriptor::get(format!(
            "certificates/{serial}/download/{}",
            format.path_segment()
        ));
        let response = self.client.execute(&descriptor).await?.into_result()?;

        let content_type = response
            .header("content-type")
            .unwrap_or("application/octet-stream")
            .to_string();
        let filename = response
            .header("content-disposition")
            .and_then(attachment_filename)
            .unwrap_or_else(|| format!("certificate_{serial}.{}", format.extension()));

        Ok(CertificateBundle {
            bytes: response.into_body(),
            content_type,
            filename,
        })
    }
}

/// Pull the filename out of a `Content-Disposition` header value.
fn attachment_filename(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let rest = rest.trim();

    let name = if let Some(quoted) = rest.strip_prefix('"') {
        quoted.split('"').next()?
    } else {
        rest.split(';').next()?.trim()
    };

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_quoted_disposition() {
        assert_eq!(
            attachment_filename(r#"attachment; filename="certificate_1a2b.p12""#),
            Some("certificate_1a2b.p12".to_string())
        );
    }

    #[test]
    fn test_filename_from_form_data_disposition() {
        // Spring's setContentDispositionFormData emits this shape.
        assert_eq!(
            attachment_filename(r#"form-data; name="attachment"; filename="certificate_9.jks""#),
            Some("certificate_9.jks".to_string())
        );
    }

    #[test]
    fn test_filename_from_unquoted_disposition() {
        assert_eq!(
            attachment_filename("attachment; filename=bundle.p12; size=42"),
            Some("bundle.p12".to_string())
        );
    }

    #[test]
    fn test_filename_absent_or_empty() {
        assert_eq!(attachment_filename("attachment"), None);
        assert_eq!(attachment_filename(r#"attachment; filename="""#), None);
    }
}
