//! Replayable request descriptors and raw backend responses.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

use crate::error::{Error, Result};

/// How the pipeline authenticates a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach the access token; a 401 goes through refresh-and-retry.
    Bearer,
    /// Attach the access token; a 401 is returned as-is (used by logout).
    BearerNoRefresh,
    /// No `Authorization` header, never refreshed (login and the refresh
    /// exchange itself).
    Anonymous,
}

/// One logical call to the backend.
///
/// The body is held as [`Bytes`] so the pipeline can resubmit the request
/// after a credential refresh without involving the caller. Descriptors are
/// immutable once built; the pipeline tracks its retry budget separately.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    auth: AuthMode,
}

impl RequestDescriptor {
    /// Create a descriptor for `method` against a path relative to the base
    /// URL. The path may carry a query string.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            auth: AuthMode::Bearer,
        }
    }

    /// Shorthand for a bearer-authenticated GET.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a bearer-authenticated POST.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    pub fn json<B: serde::Serialize>(mut self, body: &B) -> Result<Self> {
        let bytes = serde_json::to_vec(body)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Attach a raw body with an explicit content type.
    pub fn body(mut self, body: impl Into<Bytes>, content_type: HeaderValue) -> Self {
        self.headers.insert(CONTENT_TYPE, content_type);
        self.body = Some(body.into());
        self
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the authentication mode.
    pub fn auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth
    }
}

/// A fully-buffered backend response.
///
/// Non-success statuses are ordinary values here; [`execute`] only turns a 401
/// into an error after the refresh protocol has run its course.
///
/// [`execute`]: crate::ConsoleClient::execute
#[derive(Debug)]
pub struct BackendResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl BackendResponse {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Look up a header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body as lossy UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Convert a non-success response into [`Error::Backend`], passing the
    /// status and raw payload through verbatim.
    pub fn into_result(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Backend {
                status: self.status.as_u16(),
                body: self.text(),
            })
        }
    }
}
