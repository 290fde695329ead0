//! REST client for the handful of Discord endpoints the bot uses.
//!
//! Follow-up messages go through the interaction webhook (authorised by the
//! interaction token, no bot token needed). Command registration uses the
//! bot token.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;

use super::interaction::{AttachmentRef, FileUpload, MessagePayload};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Errors from the Discord REST layer.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Discord returned a non-2xx status code.
    #[error("Discord API error ({status}): {body}")]
    ApiError {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DiscordError {
    /// The message or interaction no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscordError::ApiError { status: 404, .. })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

/// HTTP client for one Discord application.
#[derive(Clone)]
pub struct DiscordClient {
    client: reqwest::Client,
    api_base: String,
    application_id: String,
    bot_token: String,
}

impl DiscordClient {
    pub fn new(
        client: reqwest::Client,
        application_id: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self::with_api_base(client, DEFAULT_API_BASE, application_id, bot_token)
    }

    pub fn with_api_base(
        client: reqwest::Client,
        api_base: impl Into<String>,
        application_id: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            application_id: application_id.into(),
            bot_token: bot_token.into(),
        }
    }

    /// Post a follow-up to the interaction identified by `token` and return
    /// the new message's id.
    ///
    /// `files` are sent as multipart parts `files[n]` next to `payload_json`.
    pub async fn create_followup(
        &self,
        token: &str,
        payload: &MessagePayload,
        files: Vec<FileUpload>,
    ) -> Result<String, DiscordError> {
        let url = format!("{}?wait=true", self.webhook_url(token));
        let request = self.client.post(url);

        let request = if files.is_empty() {
            request.json(payload)
        } else {
            request.multipart(multipart_message(payload, files)?)
        };

        let response = Self::check(request.send().await?).await?;
        let created: CreatedMessage = response.json().await?;
        Ok(created.id)
    }

    /// Replace the content of a follow-up created earlier.
    pub async fn edit_followup(
        &self,
        token: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        let url = format!("{}/messages/{message_id}", self.webhook_url(token));
        let response = self.client.patch(url).json(payload).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Overwrite the application's global slash commands.
    pub async fn register_commands(&self, commands: &Value) -> Result<usize, DiscordError> {
        let url = format!("{}/applications/{}/commands", self.api_base, self.application_id);
        let response = self
            .client
            .put(url)
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.bot_token))
            .json(commands)
            .send()
            .await?;

        let registered: Vec<Value> = Self::check(response).await?.json().await?;
        Ok(registered.len())
    }

    // ---- private helpers ----

    fn webhook_url(&self, token: &str) -> String {
        format!("{}/webhooks/{}/{token}", self.api_base, self.application_id)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DiscordError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DiscordError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn multipart_message(payload: &MessagePayload, files: Vec<FileUpload>) -> Result<Form, DiscordError> {
    let mut payload = payload.clone();
    payload.attachments = files
        .iter()
        .enumerate()
        .map(|(id, file)| AttachmentRef {
            id: id as u32,
            filename: file.filename.clone(),
        })
        .collect();

    let mut form = Form::new().text("payload_json", serde_json::to_string(&payload)?);
    for (id, file) in files.into_iter().enumerate() {
        form = form.part(
            format!("files[{id}]"),
            Part::bytes(file.bytes).file_name(file.filename),
        );
    }
    Ok(form)
}
