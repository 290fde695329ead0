//! Job kinds and the submitted-job handle.
//!
//! A [`Job`] is only the immutable part of a remote unit of work: its
//! identifier and kind. The mutable part (status) is owned by the watch
//! session observing it, and the terminal data travels in
//! [`crate::job_error::CompletedJob`] or [`crate::job_error::JobError`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::JobId;

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

/// Default delay between two status polls, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Poll ceiling for jobs expected to finish within five minutes.
pub const SHORT_JOB_MAX_ATTEMPTS: u32 = 60;

/// Poll ceiling for jobs expected to take up to ten minutes.
pub const LONG_JOB_MAX_ATTEMPTS: u32 = 120;

// ---------------------------------------------------------------------------
// JobKind
// ---------------------------------------------------------------------------

/// The request type a job was created for. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    TextToVideo,
    ImageToVideo,
    FaceSwap,
    Animation,
    LipSync,
    TalkingPhoto,
    /// Work tracked through an operation handle (`done` flag) instead of a
    /// project resource with a status string.
    LongRunningOperation,
}

impl JobKind {
    /// Every kind, in command-listing order.
    pub const ALL: [JobKind; 7] = [
        JobKind::TextToVideo,
        JobKind::ImageToVideo,
        JobKind::FaceSwap,
        JobKind::Animation,
        JobKind::LipSync,
        JobKind::TalkingPhoto,
        JobKind::LongRunningOperation,
    ];

    /// Stable kebab-case name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::TextToVideo => "text-to-video",
            JobKind::ImageToVideo => "image-to-video",
            JobKind::FaceSwap => "face-swap",
            JobKind::Animation => "animation",
            JobKind::LipSync => "lip-sync",
            JobKind::TalkingPhoto => "talking-photo",
            JobKind::LongRunningOperation => "long-running-operation",
        }
    }

    /// Human-readable title used in progress and result messages.
    pub fn label(self) -> &'static str {
        match self {
            JobKind::TextToVideo => "Text to Video",
            JobKind::ImageToVideo => "Image to Video",
            JobKind::FaceSwap => "Face Swap",
            JobKind::Animation => "Animation",
            JobKind::LipSync => "Lip Sync",
            JobKind::TalkingPhoto => "Talking Photo",
            JobKind::LongRunningOperation => "Video Generation",
        }
    }

    /// Poll ceiling callers use when they have no better estimate.
    ///
    /// Kinds that process an existing video (or run on an operation
    /// backend) get the ten-minute budget; the rest get five minutes.
    pub fn default_max_attempts(self) -> u32 {
        match self {
            JobKind::FaceSwap
            | JobKind::LipSync
            | JobKind::TalkingPhoto
            | JobKind::LongRunningOperation => LONG_JOB_MAX_ATTEMPTS,
            JobKind::TextToVideo | JobKind::ImageToVideo | JobKind::Animation => {
                SHORT_JOB_MAX_ATTEMPTS
            }
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A job accepted by a remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
}

impl Job {
    pub fn new(id: impl Into<JobId>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde_representation() {
        for kind in JobKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn long_jobs_get_ten_minute_budget() {
        assert_eq!(JobKind::FaceSwap.default_max_attempts(), 120);
        assert_eq!(JobKind::LongRunningOperation.default_max_attempts(), 120);
    }

    #[test]
    fn short_jobs_get_five_minute_budget() {
        assert_eq!(JobKind::Animation.default_max_attempts(), 60);
        assert_eq!(JobKind::TextToVideo.default_max_attempts(), 60);
    }

    #[test]
    fn job_new_accepts_str_ids() {
        let job = Job::new("proj_123", JobKind::LipSync);
        assert_eq!(job.id.as_str(), "proj_123");
        assert_eq!(job.kind, JobKind::LipSync);
    }
}
