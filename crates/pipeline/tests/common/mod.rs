//! In-memory fakes shared by the pipeline integration tests.
//!
//! Nothing here touches the network: transports replay scripted responses,
//! sinks and hosts record what they were asked to do.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use reelbot_pipeline::hosting::{AssetHost, HostError};
use reelbot_pipeline::progress::{NotificationSink, ProgressUpdate, SinkError};
use reelbot_pipeline::transport::{ApiTransport, RawResponse, TransportError};
use reelbot_pipeline::watcher::WatchConfig;

/// Watch configuration that never sleeps.
pub fn fast_config(max_attempts: u32) -> WatchConfig {
    WatchConfig::new(Duration::ZERO, max_attempts)
}

/// A `200` poll body with the given project status.
pub fn project_status(status: &str) -> RawResponse {
    RawResponse::new(200, json!({ "id": "cm1abc", "status": status }))
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Replays queued responses and records every request path.
///
/// GET requests pop from `polls`; when only one poll response remains it is
/// repeated forever, which models a job that never changes status.
#[derive(Default)]
pub struct ScriptedTransport {
    creates: Mutex<VecDeque<Result<RawResponse, String>>>,
    polls: Mutex<VecDeque<Result<RawResponse, String>>>,
    pub requests: Mutex<Vec<String>>,
    poll_count: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create(self, response: RawResponse) -> Self {
        self.creates.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn with_create_failure(self, message: &str) -> Self {
        self.creates.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn with_poll(self, response: RawResponse) -> Self {
        self.polls.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn with_poll_failure(self, message: &str) -> Self {
        self.polls.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn with_statuses(self, statuses: &[&str]) -> Self {
        statuses
            .iter()
            .fold(self, |t, status| t.with_poll(project_status(status)))
    }

    pub fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn next(queue: &Mutex<VecDeque<Result<RawResponse, String>>>) -> Result<RawResponse, TransportError> {
        let mut queue = queue.lock().unwrap();
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::Request(message)),
            None => Err(TransportError::Request("no scripted response".into())),
        }
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn post_json(&self, path: &str, _body: &Value) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(format!("POST {path}"));
        Self::next(&self.creates)
    }

    async fn get_json(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(format!("GET {path}"));
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.polls)
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Create(String),
    Edit(u64, String),
}

/// Records create/edit calls. Handles count up from 1.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub calls: Arc<Mutex<Vec<SinkCall>>>,
    /// Every edit reports the message as deleted.
    pub gone_on_edit: bool,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Create(_)))
            .count()
    }

    pub fn edits(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Edit(..)))
            .count()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    type Handle = u64;

    async fn create(&self, update: &ProgressUpdate) -> Result<u64, SinkError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(SinkCall::Create(update.description.clone()));
        Ok(calls.len() as u64)
    }

    async fn edit(&self, handle: &u64, update: &ProgressUpdate) -> Result<(), SinkError> {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Edit(*handle, update.description.clone()));
        if self.gone_on_edit {
            return Err(SinkError::Gone);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeHost
// ---------------------------------------------------------------------------

/// A host that either always fails or serves files under `base`.
pub struct FakeHost {
    name: String,
    base: Option<String>,
    pub uploads: AtomicUsize,
}

impl FakeHost {
    pub fn serving(name: &str, base: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            base: Some(base.to_string()),
            uploads: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            base: None,
            uploads: AtomicUsize::new(0),
        })
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetHost for FakeHost {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(&self, file_name: &str, _bytes: &[u8]) -> Result<String, HostError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        match &self.base {
            Some(base) => Ok(format!("{base}/{file_name}")),
            None => Err(HostError::HttpStatus {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }
}
