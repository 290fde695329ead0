//! Anonymous public file hosts used to publish assets by URL.

use async_trait::async_trait;
use reelbot_pipeline::hosting::{AssetHost, HostError};
use reqwest::multipart::{Form, Part};

use crate::http::ensure_success;

pub const CATBOX_URL: &str = "https://catbox.moe/user/api.php";
pub const NULL_POINTER_URL: &str = "https://0x0.st";

/// Uploads to catbox.moe (`reqtype=fileupload`, field `fileToUpload`).
pub struct CatboxHost {
    client: reqwest::Client,
    endpoint: String,
}

impl CatboxHost {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, CATBOX_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AssetHost for CatboxHost {
    fn name(&self) -> &str {
        "catbox"
    }

    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, HostError> {
        let form = Form::new()
            .text("reqtype", "fileupload")
            .part("fileToUpload", file_part(file_name, bytes));
        post_form(&self.client, &self.endpoint, form).await
    }
}

/// Uploads to 0x0.st (field `file`).
pub struct NullPointerHost {
    client: reqwest::Client,
    endpoint: String,
}

impl NullPointerHost {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, NULL_POINTER_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AssetHost for NullPointerHost {
    fn name(&self) -> &str {
        "0x0"
    }

    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, HostError> {
        let form = Form::new().part("file", file_part(file_name, bytes));
        post_form(&self.client, &self.endpoint, form).await
    }
}

// ---- private helpers ----

fn file_part(file_name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec()).file_name(file_name.to_string())
}

async fn post_form(client: &reqwest::Client, endpoint: &str, form: Form) -> Result<String, HostError> {
    let response = client
        .post(endpoint)
        .multipart(form)
        .send()
        .await
        .map_err(|e| HostError::Request(e.to_string()))?;
    let text = ensure_success(response)
        .await?
        .text()
        .await
        .map_err(|e| HostError::Request(e.to_string()))?;
    parse_url(&text)
}

/// Both hosts answer with the bare URL as plain text.
fn parse_url(text: &str) -> Result<String, HostError> {
    let url = text.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url.to_string())
    } else {
        Err(HostError::InvalidResponse(url.to_string()))
    }
}
