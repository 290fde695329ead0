//! Progress reporting to an editable, user-visible message.
//!
//! A [`ProgressReporter`] owns at most one message handle. The first update
//! creates the message and later ones edit it in place. If the sink reports
//! the message as gone, the reporter detaches and drops every later update;
//! the job itself keeps running.

use async_trait::async_trait;
use reelbot_core::status::{ColorState, JobStatus};

use crate::watcher::{StatusChange, StatusListener};

/// One render of the progress message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub title: String,
    pub description: String,
    pub color: ColorState,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The message was deleted or the interaction expired.
    #[error("progress message no longer exists")]
    Gone,

    #[error("failed to deliver progress update: {0}")]
    Delivery(String),
}

/// Somewhere a progress message can be created and edited.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Opaque reference to a created message.
    type Handle: Send + Sync;

    async fn create(&self, update: &ProgressUpdate) -> Result<Self::Handle, SinkError>;

    async fn edit(&self, handle: &Self::Handle, update: &ProgressUpdate) -> Result<(), SinkError>;
}

/// Keeps one progress message in sync with a job's status.
pub struct ProgressReporter<S: NotificationSink> {
    sink: S,
    handle: Option<S::Handle>,
    detached: bool,
    title: String,
    context: Vec<String>,
}

impl<S: NotificationSink> ProgressReporter<S> {
    /// * `title` - heading shown above the status, e.g. `"Animation"`.
    /// * `context` - extra lines (prompt, duration) shown under the status.
    pub fn new(sink: S, title: impl Into<String>, context: Vec<String>) -> Self {
        Self {
            sink,
            handle: None,
            detached: false,
            title: title.into(),
            context,
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Render `status` and push it to the sink.
    pub async fn report(&mut self, status: &JobStatus) {
        let update = self.render(&status.label(), status.color());
        self.update(&update).await;
    }

    /// Push an arbitrary update, e.g. a workflow step that is not a job status.
    pub async fn update(&mut self, update: &ProgressUpdate) {
        if self.detached {
            return;
        }

        let result = match self.handle.take() {
            Some(handle) => {
                let result = self.sink.edit(&handle, update).await;
                self.handle = Some(handle);
                result
            }
            None => self.sink.create(update).await.map(|handle| {
                self.handle = Some(handle);
            }),
        };

        match result {
            Ok(()) => {}
            Err(SinkError::Gone) => {
                tracing::info!(title = %self.title, "Progress message gone, detaching");
                self.detached = true;
                self.handle = None;
            }
            Err(e) => {
                tracing::warn!(title = %self.title, error = %e, "Progress update not delivered");
            }
        }
    }

    /// Build an update with this reporter's title and context lines.
    pub fn render(&self, headline: &str, color: ColorState) -> ProgressUpdate {
        let mut description = headline.to_string();
        for line in &self.context {
            description.push('\n');
            description.push_str(line);
        }
        ProgressUpdate {
            title: self.title.clone(),
            description,
            color,
        }
    }
}

#[async_trait]
impl<S: NotificationSink> StatusListener for ProgressReporter<S> {
    async fn on_status_change(&mut self, change: &StatusChange) {
        self.report(&change.status).await;
    }
}
