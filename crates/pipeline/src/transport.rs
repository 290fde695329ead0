//! JSON-over-HTTP transport seam.
//!
//! The submitter and watcher only need two verbs against a service base
//! URL. Status codes are returned, not interpreted: deciding which codes
//! count as success is the caller's job.

use async_trait::async_trait;
use serde_json::Value;

/// A response whose status code has not been judged yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed JSON body; non-JSON bodies arrive as a JSON string.
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Creation calls accept exactly 200 and 201.
    pub fn is_created(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    /// Status polls accept exactly 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The request never produced a response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// `POST {base}{path}` with a JSON body.
    async fn post_json(&self, path: &str, body: &Value) -> Result<RawResponse, TransportError>;

    /// `GET {base}{path}`.
    async fn get_json(&self, path: &str) -> Result<RawResponse, TransportError>;
}

/// Best human-readable message from an error body: its `message` field,
/// the body itself when it is a bare string, or the raw JSON otherwise.
pub fn error_message(body: &Value) -> String {
    match body.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => match body {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
    }
}
