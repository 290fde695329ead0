//! Follow-up messages as a notification sink.

use std::sync::Arc;

use async_trait::async_trait;
use reelbot_pipeline::progress::{NotificationSink, ProgressUpdate, SinkError};

use super::client::{DiscordClient, DiscordError};
use super::interaction::{FileUpload, MessagePayload};
use crate::render;

/// The follow-up operations commands need, behind a seam so handlers can
/// run against an in-memory recorder.
#[async_trait]
pub trait FollowupApi: Send + Sync {
    /// Returns the created message's id.
    async fn create_followup(
        &self,
        token: &str,
        payload: &MessagePayload,
        files: Vec<FileUpload>,
    ) -> Result<String, DiscordError>;

    async fn edit_followup(
        &self,
        token: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError>;
}

#[async_trait]
impl FollowupApi for DiscordClient {
    async fn create_followup(
        &self,
        token: &str,
        payload: &MessagePayload,
        files: Vec<FileUpload>,
    ) -> Result<String, DiscordError> {
        DiscordClient::create_followup(self, token, payload, files).await
    }

    async fn edit_followup(
        &self,
        token: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        DiscordClient::edit_followup(self, token, message_id, payload).await
    }
}

/// Progress as one embed follow-up of a deferred interaction.
#[derive(Clone)]
pub struct FollowupSink {
    api: Arc<dyn FollowupApi>,
    token: String,
}

impl FollowupSink {
    pub fn new(api: Arc<dyn FollowupApi>, token: impl Into<String>) -> Self {
        Self {
            api,
            token: token.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for FollowupSink {
    type Handle = String;

    async fn create(&self, update: &ProgressUpdate) -> Result<String, SinkError> {
        let payload = MessagePayload::embed(render::progress_embed(update));
        self.api
            .create_followup(&self.token, &payload, Vec::new())
            .await
            .map_err(sink_error)
    }

    async fn edit(&self, handle: &String, update: &ProgressUpdate) -> Result<(), SinkError> {
        let payload = MessagePayload::embed(render::progress_embed(update));
        self.api
            .edit_followup(&self.token, handle, &payload)
            .await
            .map_err(sink_error)
    }
}

fn sink_error(e: DiscordError) -> SinkError {
    if e.is_not_found() {
        SinkError::Gone
    } else {
        SinkError::Delivery(e.to_string())
    }
}
