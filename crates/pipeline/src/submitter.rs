//! Job creation: one outbound call, no retries.

use std::sync::Arc;

use reelbot_core::job::{Job, JobKind};
use reelbot_core::job_error::{CompletedJob, JobError};
use reelbot_core::types::JobId;
use serde_json::Value;

use crate::protocol::JobProtocol;
use crate::transport::{error_message, ApiTransport};

/// Identifier used for results that never had a pollable handle.
pub const INLINE_JOB_ID: &str = "inline";

/// What a successful creation call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    /// The service accepted the job and issued an identifier to poll.
    Accepted(Job),
    /// The service finished the work within the creation call.
    Finished(CompletedJob),
}

impl Submitted {
    pub fn id(&self) -> &JobId {
        match self {
            Submitted::Accepted(job) => &job.id,
            Submitted::Finished(done) => &done.id,
        }
    }
}

/// Turns a request into exactly one creation call.
///
/// Parameters are forwarded untouched; validating them against the kind is
/// the caller's job.
#[derive(Clone)]
pub struct JobSubmitter {
    transport: Arc<dyn ApiTransport>,
    protocol: Arc<dyn JobProtocol>,
}

impl JobSubmitter {
    pub fn new(transport: Arc<dyn ApiTransport>, protocol: Arc<dyn JobProtocol>) -> Self {
        Self {
            transport,
            protocol,
        }
    }

    /// Create a job of `kind` with the given request body.
    ///
    /// A status other than 200/201 becomes [`JobError::Submission`] carrying
    /// the status and the body's message. A success without an identifier
    /// becomes [`JobError::MalformedResponse`].
    pub async fn submit(&self, kind: JobKind, parameters: &Value) -> Result<Submitted, JobError> {
        let path = self
            .protocol
            .creation_path(kind)
            .ok_or_else(|| JobError::Submission {
                status: None,
                message: format!("{kind} jobs are not supported by this service"),
            })?;

        let response = self
            .transport
            .post_json(&path, parameters)
            .await
            .map_err(|e| JobError::Submission {
                status: None,
                message: e.to_string(),
            })?;

        if !response.is_created() {
            tracing::warn!(
                kind = %kind,
                status = response.status,
                "Job creation rejected",
            );
            return Err(JobError::Submission {
                status: Some(response.status),
                message: error_message(&response.body),
            });
        }

        if let Some(detail) = self.protocol.creation_error(&response.body) {
            return Err(JobError::Submission {
                status: Some(response.status),
                message: detail,
            });
        }

        let id = self.protocol.extract_id(&response.body);

        if let Some(payload) = self.protocol.inline_result(&response.body) {
            let id = id.unwrap_or_else(|| JobId::from(INLINE_JOB_ID));
            tracing::info!(job_id = %id, kind = %kind, "Job finished during creation");
            return Ok(Submitted::Finished(CompletedJob {
                id,
                kind,
                payload,
                attempts: 0,
            }));
        }

        let id = id.ok_or_else(|| JobError::malformed("Response has no job id", &response.body))?;

        tracing::info!(job_id = %id, kind = %kind, "Job submitted");
        Ok(Submitted::Accepted(Job::new(id, kind)))
    }
}
