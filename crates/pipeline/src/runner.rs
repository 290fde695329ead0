//! Submit-then-watch in one call.

use reelbot_core::job::JobKind;
use reelbot_core::job_error::JobResult;
use reelbot_core::status::JobStatus;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::submitter::{JobSubmitter, Submitted};
use crate::watcher::{JobWatcher, StatusChange, StatusListener, WatchConfig};

/// Runs one job from creation to a terminal outcome.
#[derive(Clone)]
pub struct JobRunner {
    submitter: JobSubmitter,
    watcher: JobWatcher,
}

impl JobRunner {
    pub fn new(submitter: JobSubmitter, watcher: JobWatcher) -> Self {
        Self { submitter, watcher }
    }

    /// Submit `parameters` as a `kind` job and watch it.
    ///
    /// A job that finished during creation produces a single `Complete`
    /// notification and skips polling.
    pub async fn run<L>(
        &self,
        kind: JobKind,
        parameters: &Value,
        config: &WatchConfig,
        listener: &mut L,
        cancel: &CancellationToken,
    ) -> JobResult
    where
        L: StatusListener + ?Sized,
    {
        match self.submitter.submit(kind, parameters).await? {
            Submitted::Accepted(job) => self.watcher.watch(&job, config, listener, cancel).await,
            Submitted::Finished(done) => {
                let status = JobStatus::Complete;
                let change = StatusChange {
                    job_id: done.id.clone(),
                    kind: done.kind,
                    label: status.label().into_owned(),
                    status,
                    attempt: 0,
                };
                listener.on_status_change(&change).await;
                Ok(done)
            }
        }
    }
}
