//! Route handlers for the edge gateway.
//!
//! Every handler forwards to the certificate backend and relays the response
//! without interpreting it. The two exceptions are logout and revoke, whose
//! plain-text success bodies are wrapped as `{"message": ...}` so browser
//! callers always receive JSON.

use std::sync::Arc;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, Method, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;

use crate::GatewayState;
use crate::error::{GatewayError, Result};

/// Handle GET /health without touching the backend.
pub(crate) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "certdesk-gateway"
    }))
}

/// Handle POST /api/auth/login.
pub(crate) async fn login(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let upstream = state
        .upstream
        .forward(
            Method::POST,
            "auth/login",
            None,
            json_content_type(&headers),
            Some(body),
        )
        .await?;
    relay(upstream).await
}

/// Handle POST /api/auth/refresh.
pub(crate) async fn refresh(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let upstream = state
        .upstream
        .forward(
            Method::POST,
            "auth/refresh",
            None,
            json_content_type(&headers),
            Some(body),
        )
        .await?;
    relay(upstream).await
}

/// Handle POST /api/auth/logout.
pub(crate) async fn logout(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let upstream = state
        .upstream
        .forward(Method::POST, "auth/logout", authorization(&headers), None, None)
        .await?;
    relay_message(upstream).await
}

/// Handle GET /api/certificates, passing any query string through.
pub(crate) async fn list_certificates(
    State(state): State<Arc<GatewayState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response> {
    let path = match query {
        Some(query) => format!("certificates?{}", query),
        None => "certificates".to_string(),
    };
    let upstream = state
        .upstream
        .forward(Method::GET, &path, authorization(&headers), None, None)
        .await?;
    relay(upstream).await
}

/// Handle POST /api/certificates.
pub(crate) async fn create_certificate(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let upstream = state
        .upstream
        .forward(
            Method::POST,
            "certificates",
            authorization(&headers),
            json_content_type(&headers),
            Some(body),
        )
        .await?;
    relay(upstream).await
}

/// Handle GET /api/certificates/{serial}.
pub(crate) async fn get_certificate(
    State(state): State<Arc<GatewayState>>,
    Path(serial): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let path = format!("certificates/{}", serial);
    let upstream = state
        .upstream
        .forward(Method::GET, &path, authorization(&headers), None, None)
        .await?;
    relay(upstream).await
}

/// Handle GET /api/certificates/type/{kind}.
pub(crate) async fn list_certificates_by_type(
    State(state): State<Arc<GatewayState>>,
    Path(kind): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let path = format!("certificates/type/{}", kind);
    let upstream = state
        .upstream
        .forward(Method::GET, &path, authorization(&headers), None, None)
        .await?;
    relay(upstream).await
}

/// Handle POST /api/certificates/{serial}/revoke.
pub(crate) async fn revoke_certificate(
    State(state): State<Arc<GatewayState>>,
    Path(serial): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let path = format!("certificates/{}/revoke", serial);
    let upstream = state
        .upstream
        .forward(Method::POST, &path, authorization(&headers), None, None)
        .await?;
    relay_message(upstream).await
}

/// Handle GET /api/certificates/{serial}/download/{format}.
///
/// Success bodies are streamed rather than buffered; PKCS12 bundles can be
/// large enough that buffering them per request is wasteful.
pub(crate) async fn download_certificate(
    State(state): State<Arc<GatewayState>>,
    Path((serial, format)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response> {
    let path = format!("certificates/{}/download/{}", serial, format);
    let upstream = state
        .upstream
        .forward(Method::GET, &path, authorization(&headers), None, None)
        .await?;

    if !upstream.status().is_success() {
        return relay(upstream).await;
    }

    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let disposition = upstream
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .cloned()
        .unwrap_or_else(|| fallback_disposition(&serial, &format));

    let stream = upstream
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| GatewayError::Internal(format!("Failed to build response: {}", e)))
}

/// Copy the caller's `Authorization` header, if any.
fn authorization(headers: &HeaderMap) -> Option<HeaderValue> {
    headers.get(header::AUTHORIZATION).cloned()
}

/// Copy the caller's `Content-Type`, defaulting to JSON for forwarded bodies.
fn json_content_type(headers: &HeaderMap) -> Option<HeaderValue> {
    Some(
        headers
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json")),
    )
}

/// Relay an upstream response verbatim: status, body, and `Content-Type`.
async fn relay(upstream: reqwest::Response) -> Result<Response> {
    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let body = upstream.bytes().await.map_err(GatewayError::Upstream)?;

    let mut response = Response::builder().status(status);
    if let Some(value) = content_type {
        response = response.header(header::CONTENT_TYPE, value);
    }
    response
        .body(Body::from(body))
        .map_err(|e| GatewayError::Internal(format!("Failed to build response: {}", e)))
}

/// Wrap a plain-text 2xx body as `{"message": text}`; relay anything else
/// verbatim.
async fn relay_message(upstream: reqwest::Response) -> Result<Response> {
    if !upstream.status().is_success() {
        return relay(upstream).await;
    }

    let status = upstream.status();
    let text = upstream.text().await.map_err(GatewayError::Upstream)?;
    let body = serde_json::json!({ "message": text });
    Ok((status, Json(body)).into_response())
}

/// Build `attachment; filename="certificate_{serial}.{ext}"` for backends
/// that omit the disposition header.
fn fallback_disposition(serial: &str, format: &str) -> HeaderValue {
    let extension = match format.to_ascii_uppercase().as_str() {
        "PKCS12" => "p12".to_string(),
        "JKS" => "jks".to_string(),
        _ => format.to_ascii_lowercase(),
    };
    let value = format!("attachment; filename=\"certificate_{}.{}\"", serial, extension);
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
