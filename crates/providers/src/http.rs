//! Shared reqwest plumbing and the JSON transport for job services.

use std::time::Duration;

use async_trait::async_trait;
use reelbot_pipeline::hosting::HostError;
use reelbot_pipeline::media::FetchError;
use reelbot_pipeline::narration::ContentError;
use reelbot_pipeline::transport::{ApiTransport, RawResponse, TransportError};
use serde_json::Value;

/// Timeout for a single request to a job service. Polls are short; creation
/// calls may upload references server-side.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from a provider HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    ApiError {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<HttpError> for ContentError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Request(e) => ContentError::Request(e.to_string()),
            HttpError::ApiError { status, body } => ContentError::HttpStatus { status, body },
        }
    }
}

impl From<HttpError> for HostError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Request(e) => HostError::Request(e.to_string()),
            HttpError::ApiError { status, body } => HostError::HttpStatus { status, body },
        }
    }
}

impl From<HttpError> for FetchError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Request(e) => FetchError::Request(e.to_string()),
            HttpError::ApiError { status, .. } => FetchError::HttpStatus(status),
        }
    }
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or [`HttpError::ApiError`] with the body text.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(HttpError::ApiError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Build a pooled client with the given per-request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// How a service expects its API key.
#[derive(Clone)]
pub enum ApiAuth {
    /// `Authorization: Bearer <key>`.
    Bearer(String),
    /// A vendor header such as `x-goog-api-key`.
    Header { name: &'static str, value: String },
}

impl ApiAuth {
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            ApiAuth::Bearer(token) => request.bearer_auth(token),
            ApiAuth::Header { name, value } => request.header(*name, value),
        }
    }
}

impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuth::Bearer(_) => f.write_str("Bearer(***)"),
            ApiAuth::Header { name, .. } => write!(f, "Header({name}: ***)"),
        }
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// [`ApiTransport`] over a base URL, e.g. `https://api.magichour.ai/v1`.
///
/// Responses of any status are returned; the body is parsed as JSON when
/// possible and kept as a JSON string otherwise.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    auth: ApiAuth,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, auth: ApiAuth) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<RawResponse, TransportError> {
        let response = self
            .auth
            .apply(request)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(RawResponse::new(status, parse_body(text)))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<RawResponse, TransportError> {
        tracing::debug!(path, "POST");
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn get_json(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.send(self.client.get(self.url(path))).await
    }
}

/// JSON when it parses, otherwise the raw text as a JSON string.
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
