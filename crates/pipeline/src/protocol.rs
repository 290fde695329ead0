//! Strategies describing how a family of remote jobs is addressed and read.
//!
//! The watcher loop is the same for every service; what differs is where
//! the status lives, how failure is reported and where the result sits.
//! [`ProjectProtocol`] covers services that expose a project resource with a
//! `status` string. [`OperationProtocol`] covers services that hand back an
//! operation handle with a `done` flag and a nested `response`.

use reelbot_core::job::{Job, JobKind};
use reelbot_core::status::JobStatus;
use reelbot_core::types::JobId;
use serde_json::Value;

/// Failure detail used when the service reports an error without one.
pub const UNKNOWN_ERROR: &str = "Unknown error";

pub trait JobProtocol: Send + Sync {
    /// Creation endpoint for `kind`, or `None` when the service cannot run it.
    fn creation_path(&self, kind: JobKind) -> Option<String>;

    /// Identifier issued by a successful creation call.
    fn extract_id(&self, body: &Value) -> Option<JobId>;

    /// Error reported inside a creation response that still carried a
    /// success status code.
    fn creation_error(&self, _body: &Value) -> Option<String> {
        None
    }

    /// Result returned directly by the creation call, skipping the poll loop.
    fn inline_result(&self, _body: &Value) -> Option<Value> {
        None
    }

    /// Status endpoint for an accepted job.
    fn status_path(&self, job: &Job) -> String;

    /// Status of a polled job, or `None` when the body carries none.
    fn extract_status(&self, body: &Value) -> Option<JobStatus>;

    /// Human-readable failure detail from a body whose status is `error`.
    fn failure_detail(&self, body: &Value) -> String;

    /// Result payload from a body whose status is `complete`.
    fn extract_result(&self, body: Value) -> Value;
}

// ---------------------------------------------------------------------------
// Project-style services
// ---------------------------------------------------------------------------

/// Jobs created at a kind-specific endpoint and polled at
/// `/{type}-projects/{id}`.
#[derive(Debug, Clone, Default)]
pub struct ProjectProtocol;

/// All supported project kinds produce video projects.
const PROJECT_TYPE: &str = "video";

impl JobProtocol for ProjectProtocol {
    fn creation_path(&self, kind: JobKind) -> Option<String> {
        let path = match kind {
            JobKind::TextToVideo => "/text-to-video",
            JobKind::ImageToVideo => "/image-to-video",
            JobKind::FaceSwap => "/face-swap",
            JobKind::Animation => "/animation",
            JobKind::LipSync => "/lip-sync",
            JobKind::TalkingPhoto => "/ai-talking-photo",
            JobKind::LongRunningOperation => return None,
        };
        Some(path.to_string())
    }

    fn extract_id(&self, body: &Value) -> Option<JobId> {
        non_empty_str(body.get("id")).map(JobId::from)
    }

    fn status_path(&self, job: &Job) -> String {
        format!("/{PROJECT_TYPE}-projects/{}", job.id)
    }

    fn extract_status(&self, body: &Value) -> Option<JobStatus> {
        body.get("status")
            .and_then(Value::as_str)
            .map(JobStatus::from_raw)
    }

    fn failure_detail(&self, body: &Value) -> String {
        error_detail(body.get("error"))
    }

    fn extract_result(&self, body: Value) -> Value {
        body
    }
}

// ---------------------------------------------------------------------------
// Long-running operations
// ---------------------------------------------------------------------------

/// Jobs started at one fixed endpoint and polled at `/{name}`.
///
/// An operation is `rendering` until `done` is true, then `error` when it
/// carries an `error` object and `complete` otherwise. A missing `done`
/// field means not done.
#[derive(Debug, Clone)]
pub struct OperationProtocol {
    creation_path: String,
}

impl OperationProtocol {
    /// * `creation_path` - e.g. `/models/veo-2.0-generate-001:predictLongRunning`.
    pub fn new(creation_path: impl Into<String>) -> Self {
        Self {
            creation_path: creation_path.into(),
        }
    }
}

impl JobProtocol for OperationProtocol {
    fn creation_path(&self, kind: JobKind) -> Option<String> {
        (kind == JobKind::LongRunningOperation).then(|| self.creation_path.clone())
    }

    fn extract_id(&self, body: &Value) -> Option<JobId> {
        non_empty_str(body.get("name")).map(JobId::from)
    }

    fn creation_error(&self, body: &Value) -> Option<String> {
        body.get("error")
            .filter(|e| !e.is_null())
            .map(|e| error_detail(Some(e)))
    }

    fn inline_result(&self, body: &Value) -> Option<Value> {
        let finished = body.get("done").and_then(Value::as_bool).unwrap_or(false);
        let failed = body.get("error").is_some_and(|e| !e.is_null());
        (finished && !failed).then(|| self.extract_result(body.clone()))
    }

    fn status_path(&self, job: &Job) -> String {
        format!("/{}", job.id.as_str().trim_start_matches('/'))
    }

    fn extract_status(&self, body: &Value) -> Option<JobStatus> {
        let operation = body.as_object()?;
        let done = operation
            .get("done")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let status = if !done {
            JobStatus::Rendering
        } else if operation.get("error").is_some_and(|e| !e.is_null()) {
            JobStatus::Error
        } else {
            JobStatus::Complete
        };
        Some(status)
    }

    fn failure_detail(&self, body: &Value) -> String {
        error_detail(body.get("error"))
    }

    fn extract_result(&self, mut body: Value) -> Value {
        body.get_mut("response").map(Value::take).unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Error detail from a vendor `error` field: a bare string, an object's
/// `message`, or the raw JSON.
fn error_detail(error: Option<&Value>) -> String {
    match error {
        None | Some(Value::Null) => UNKNOWN_ERROR.to_string(),
        Some(Value::String(message)) if !message.trim().is_empty() => message.clone(),
        Some(Value::String(_)) => UNKNOWN_ERROR.to_string(),
        Some(other) => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
