//! Terminal outcomes of submitting and watching a job.
//!
//! Every failure the submitter or watcher can hit is folded into one
//! [`JobError`] so callers only ever render a single structured result.

use std::time::Duration;

use serde_json::Value;

use crate::job::JobKind;
use crate::types::JobId;

/// A job that reached `complete`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedJob {
    pub id: JobId,
    pub kind: JobKind,
    /// Full body of the final poll (or the nested result for operations).
    pub payload: Value,
    /// Number of polls performed; zero when the creation call returned the
    /// result inline.
    pub attempts: u32,
}

/// Outcome of one submit-and-watch cycle.
pub type JobResult = Result<CompletedJob, JobError>;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum JobError {
    /// The creation call was rejected or never reached the service.
    #[error("{}", submission_message(.status, .message))]
    Submission { status: Option<u16>, message: String },

    /// A status poll failed. Polling never retries.
    #[error("Error checking status: {}", poll_message(.status, .message))]
    Poll { status: Option<u16>, message: String },

    /// The service reported the job as failed.
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// The poll budget ran out before a terminal status.
    #[error("Timeout: Generation took longer than {}", budget_text(.budget))]
    Timeout { budget: Duration },

    /// A success response lacked a field the pipeline depends on.
    #[error("{reason}. Response: {body}")]
    MalformedResponse { reason: String, body: String },

    /// The caller went away before the job finished.
    #[error("Watch cancelled before the job finished")]
    Cancelled,
}

impl JobError {
    pub fn malformed(reason: impl Into<String>, body: &Value) -> Self {
        JobError::MalformedResponse {
            reason: reason.into(),
            body: body.to_string(),
        }
    }

    /// Short machine-friendly name, used as a tracing field.
    pub fn code(&self) -> &'static str {
        match self {
            JobError::Submission { .. } => "submission",
            JobError::Poll { .. } => "poll",
            JobError::GenerationFailure(_) => "generation_failure",
            JobError::Timeout { .. } => "timeout",
            JobError::MalformedResponse { .. } => "malformed_response",
            JobError::Cancelled => "cancelled",
        }
    }
}

fn submission_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API Error ({code}): {message}"),
        None => format!("API request failed: {message}"),
    }
}

fn poll_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP {code}: {message}"),
        None => message.to_string(),
    }
}

fn budget_text(budget: &Duration) -> String {
    format_budget(*budget)
}

/// Render a wait budget the way users read it: whole minutes when the
/// budget is a multiple of a minute, seconds otherwise.
pub fn format_budget(budget: Duration) -> String {
    let secs = budget.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{minutes} minutes"),
        _ => format!("{secs} seconds"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
