//! Publishing local files at a public URL through an ordered list of hosts.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// A single host's upload attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("upload request failed: {0}")]
    Request(String),

    #[error("host returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("host returned no URL: {0}")]
    InvalidResponse(String),
}

/// Why one host in the chain was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub host: String,
    pub reason: String,
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.host, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostingError {
    /// Every host in the chain failed (or the chain is empty).
    #[error("No upload host available ({})", describe_failures(.failures))]
    NoHostAvailable { failures: Vec<HostFailure> },
}

fn describe_failures(failures: &[HostFailure]) -> String {
    if failures.is_empty() {
        return "no hosts configured".to_string();
    }
    failures
        .iter()
        .map(HostFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// AssetHost
// ---------------------------------------------------------------------------

/// A public file host.
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Upload `bytes` as `file_name` and return the public URL.
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, HostError>;
}

/// A successfully published file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedAsset {
    pub url: String,
    /// Name of the host that accepted the upload.
    pub host: String,
}

// ---------------------------------------------------------------------------
// HostChain
// ---------------------------------------------------------------------------

/// Tries each host in order and stops at the first success.
#[derive(Clone, Default)]
pub struct HostChain {
    hosts: Vec<Arc<dyn AssetHost>>,
}

impl HostChain {
    pub fn new(hosts: Vec<Arc<dyn AssetHost>>) -> Self {
        Self { hosts }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub async fn publish(&self, file_name: &str, bytes: &[u8]) -> Result<HostedAsset, HostingError> {
        let mut failures = Vec::new();

        for host in &self.hosts {
            match host.upload(file_name, bytes).await {
                Ok(url) => {
                    tracing::info!(host = host.name(), file_name, url = %url, "Asset hosted");
                    return Ok(HostedAsset {
                        url,
                        host: host.name().to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(host = host.name(), file_name, error = %e, "Upload host failed, trying next");
                    failures.push(HostFailure {
                        host: host.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(HostingError::NoHostAvailable { failures })
    }
}
