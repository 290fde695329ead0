//! Bounded status polling for a submitted job.
//!
//! [`JobWatcher::watch`] runs the `POLLING` self-loop: query, classify,
//! notify on change, then either terminate or sleep. It stops on the first
//! terminal status, on the first failed poll, when the attempt budget is
//! spent, or when the caller's [`CancellationToken`] fires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reelbot_core::job::{Job, JobKind, DEFAULT_POLL_INTERVAL_SECS, SHORT_JOB_MAX_ATTEMPTS};
use reelbot_core::job_error::{CompletedJob, JobError, JobResult};
use reelbot_core::status::{JobStatus, TerminalKind};
use reelbot_core::types::JobId;
use tokio_util::sync::CancellationToken;

use crate::protocol::JobProtocol;
use crate::transport::{error_message, ApiTransport};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Poll cadence and ceiling for one watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    /// Hard ceiling on polls. Always at least 1.
    pub max_attempts: u32,
}

impl WatchConfig {
    pub fn new(poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            poll_interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Budget chosen from the kind's expected latency.
    pub fn for_kind(kind: JobKind, poll_interval: Duration) -> Self {
        Self::new(poll_interval, kind.default_max_attempts())
    }

    /// Worst-case wall-clock wait: `max_attempts * poll_interval`.
    pub fn budget(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            SHORT_JOB_MAX_ATTEMPTS,
        )
    }
}

// ---------------------------------------------------------------------------
// Status change notifications
// ---------------------------------------------------------------------------

/// A transition to a status different from the previously reported one.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub job_id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Display label from the status classification.
    pub label: String,
    /// The poll (1-based) that observed the new status.
    pub attempt: u32,
}

/// Receives status transitions, in order, one call per distinct change.
#[async_trait]
pub trait StatusListener: Send {
    async fn on_status_change(&mut self, change: &StatusChange);
}

/// Discards every notification.
#[async_trait]
impl StatusListener for () {
    async fn on_status_change(&mut self, _change: &StatusChange) {}
}

/// Records every notification, in order.
#[async_trait]
impl StatusListener for Vec<StatusChange> {
    async fn on_status_change(&mut self, change: &StatusChange) {
        self.push(change.clone());
    }
}

// ---------------------------------------------------------------------------
// Watch session
// ---------------------------------------------------------------------------

/// Bookkeeping for one watch: the last status a notification went out for
/// and how many polls have run. `last_reported` starts as `None`, which
/// differs from every real status, so the first observation always notifies.
struct WatchSession<'a> {
    job: &'a Job,
    last_reported: Option<JobStatus>,
    attempt_count: u32,
}

impl<'a> WatchSession<'a> {
    fn new(job: &'a Job) -> Self {
        Self {
            job,
            last_reported: None,
            attempt_count: 0,
        }
    }

    fn begin_poll(&mut self) -> u32 {
        self.attempt_count += 1;
        self.attempt_count
    }

    fn is_change(&self, status: &JobStatus) -> bool {
        self.last_reported.as_ref() != Some(status)
    }

    fn mark_reported(&mut self, status: JobStatus) {
        self.last_reported = Some(status);
    }

    fn change(&self, status: &JobStatus) -> StatusChange {
        StatusChange {
            job_id: self.job.id.clone(),
            kind: self.job.kind,
            status: status.clone(),
            label: status.label().into_owned(),
            attempt: self.attempt_count,
        }
    }
}

// ---------------------------------------------------------------------------
// JobWatcher
// ---------------------------------------------------------------------------

/// Polls a job until it completes, fails, times out or is cancelled.
///
/// Holds no per-job state, so one watcher serves any number of concurrent
/// watches.
#[derive(Clone)]
pub struct JobWatcher {
    transport: Arc<dyn ApiTransport>,
    protocol: Arc<dyn JobProtocol>,
}

impl JobWatcher {
    pub fn new(transport: Arc<dyn ApiTransport>, protocol: Arc<dyn JobProtocol>) -> Self {
        Self {
            transport,
            protocol,
        }
    }

    /// Watch `job` until a terminal outcome.
    ///
    /// `listener` is called once per distinct status, before the next poll.
    /// Any failed poll ends the watch with [`JobError::Poll`]; it is never
    /// retried. After `config.max_attempts` non-terminal polls the result is
    /// [`JobError::Timeout`]. Cancellation is checked before every poll and
    /// while sleeping.
    pub async fn watch<L>(
        &self,
        job: &Job,
        config: &WatchConfig,
        listener: &mut L,
        cancel: &CancellationToken,
    ) -> JobResult
    where
        L: StatusListener + ?Sized,
    {
        let mut session = WatchSession::new(job);
        let path = self.protocol.status_path(job);

        loop {
            if cancel.is_cancelled() {
                tracing::info!(job_id = %job.id, attempts = session.attempt_count, "Watch cancelled");
                return Err(JobError::Cancelled);
            }

            let attempt = session.begin_poll();
            let response = self
                .transport
                .get_json(&path)
                .await
                .map_err(|e| JobError::Poll {
                    status: None,
                    message: e.to_string(),
                })?;

            if !response.is_ok() {
                tracing::warn!(
                    job_id = %job.id,
                    attempt,
                    status = response.status,
                    "Status poll failed",
                );
                return Err(JobError::Poll {
                    status: Some(response.status),
                    message: error_message(&response.body),
                });
            }

            let status = self.protocol.extract_status(&response.body).ok_or_else(|| {
                JobError::malformed("Status response has no status", &response.body)
            })?;

            tracing::debug!(
                job_id = %job.id,
                attempt,
                status = %status,
                "Polled job",
            );

            if session.is_change(&status) {
                listener.on_status_change(&session.change(&status)).await;
                session.mark_reported(status.clone());
            }

            match status.terminal_kind() {
                Some(TerminalKind::Success) => {
                    return Ok(CompletedJob {
                        id: job.id.clone(),
                        kind: job.kind,
                        payload: self.protocol.extract_result(response.body),
                        attempts: attempt,
                    });
                }
                Some(TerminalKind::Failure) => {
                    return Err(JobError::GenerationFailure(
                        self.protocol.failure_detail(&response.body),
                    ));
                }
                None => {}
            }

            if attempt >= config.max_attempts {
                tracing::warn!(
                    job_id = %job.id,
                    attempts = attempt,
                    budget_secs = config.budget().as_secs(),
                    "Watch budget exhausted",
                );
                return Err(JobError::Timeout {
                    budget: config.budget(),
                });
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(job_id = %job.id, attempts = attempt, "Watch cancelled");
                    return Err(JobError::Cancelled);
                }
                _ = tokio::time::sleep(config.poll_interval) => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
