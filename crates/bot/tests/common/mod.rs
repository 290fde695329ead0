//! Test harness for the bot crate: in-memory Discord, job service and
//! downloads, plus helpers for signed interaction requests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use ed25519_dalek::{Signer, SigningKey};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use reelbot_bot::characters::CharacterLibrary;
use reelbot_bot::config::BotConfig;
use reelbot_bot::discord::client::DiscordError;
use reelbot_bot::discord::interaction::{FileUpload, MessagePayload};
use reelbot_bot::discord::sink::FollowupApi;
use reelbot_bot::routes;
use reelbot_bot::services::{self, Services};
use reelbot_bot::signature::SignatureVerifier;
use reelbot_bot::state::AppState;
use reelbot_pipeline::hosting::{AssetHost, HostChain, HostError};
use reelbot_pipeline::media::{AssetFetcher, FetchError};
use reelbot_pipeline::protocol::ProjectProtocol;
use reelbot_pipeline::transport::{ApiTransport, RawResponse, TransportError};

pub const TEST_TIMESTAMP: &str = "1700000000";

// ---------------------------------------------------------------------------
// Job service
// ---------------------------------------------------------------------------

/// Answers every creation with `create` and replays `polls`, repeating the
/// last one.
pub struct FakeJobService {
    create: RawResponse,
    polls: Mutex<VecDeque<RawResponse>>,
    pub requests: Mutex<Vec<(String, Value)>>,
}

impl FakeJobService {
    pub fn new(create: RawResponse, polls: Vec<RawResponse>) -> Arc<Self> {
        Arc::new(Self {
            create,
            polls: Mutex::new(polls.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A project that goes `queued` then `complete` with `result` merged in.
    pub fn completing(result: Value) -> Arc<Self> {
        let mut done = json!({ "id": "proj_1", "status": "complete" });
        if let (Some(done), Some(extra)) = (done.as_object_mut(), result.as_object()) {
            done.extend(extra.clone());
        }
        Self::new(
            RawResponse::new(200, json!({ "id": "proj_1" })),
            vec![
                RawResponse::new(200, json!({ "id": "proj_1", "status": "queued" })),
                RawResponse::new(200, done),
            ],
        )
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiTransport for FakeJobService {
    async fn post_json(&self, path: &str, body: &Value) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((format!("POST {path}"), body.clone()));
        Ok(self.create.clone())
    }

    async fn get_json(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((format!("GET {path}"), Value::Null));
        let mut polls = self.polls.lock().unwrap();
        let next = if polls.len() > 1 {
            polls.pop_front()
        } else {
            polls.front().cloned()
        };
        next.ok_or_else(|| TransportError::Request("no scripted poll".into()))
    }
}

// ---------------------------------------------------------------------------
// Discord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Followup {
    Created {
        payload: MessagePayload,
        files: Vec<String>,
    },
    Edited {
        message_id: String,
        payload: MessagePayload,
    },
}

/// Records follow-ups instead of sending them. Message ids count up from 1.
#[derive(Default)]
pub struct RecordingFollowups {
    pub calls: Mutex<Vec<Followup>>,
}

impl RecordingFollowups {
    pub fn calls(&self) -> Vec<Followup> {
        self.calls.lock().unwrap().clone()
    }

    /// Payloads of created messages, in order.
    pub fn created(&self) -> Vec<(MessagePayload, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Followup::Created { payload, files } => Some((payload, files)),
                Followup::Edited { .. } => None,
            })
            .collect()
    }

    /// The last created message: the command's result.
    pub fn result(&self) -> (MessagePayload, Vec<String>) {
        self.created().pop().expect("no follow-up was created")
    }
}

#[async_trait]
impl FollowupApi for RecordingFollowups {
    async fn create_followup(
        &self,
        _token: &str,
        payload: &MessagePayload,
        files: Vec<FileUpload>,
    ) -> Result<String, DiscordError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Followup::Created {
            payload: payload.clone(),
            files: files.into_iter().map(|f| f.filename).collect(),
        });
        Ok(calls.len().to_string())
    }

    async fn edit_followup(
        &self,
        _token: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        self.calls.lock().unwrap().push(Followup::Edited {
            message_id: message_id.to_string(),
            payload: payload.clone(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Downloads and hosting
// ---------------------------------------------------------------------------

/// Returns `bytes` for every URL, or fails when `bytes` is `None`.
pub struct StaticFetcher {
    pub bytes: Option<Vec<u8>>,
}

#[async_trait]
impl AssetFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        self.bytes.clone().ok_or(FetchError::HttpStatus(404))
    }
}

pub struct StaticHost;

#[async_trait]
impl AssetHost for StaticHost {
    fn name(&self) -> &str {
        "static"
    }

    async fn upload(&self, file_name: &str, _bytes: &[u8]) -> Result<String, HostError> {
        Ok(format!("https://files.test/{file_name}"))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub services: Arc<Services>,
    pub followups: Arc<RecordingFollowups>,
    pub jobs: Arc<FakeJobService>,
}

/// Services over fakes, polling every millisecond.
pub fn harness(jobs: Arc<FakeJobService>, download: Option<Vec<u8>>, characters: &Path) -> Harness {
    let followups = Arc::new(RecordingFollowups::default());
    let hosts = HostChain::new(vec![Arc::new(StaticHost)]);
    let transport: Arc<dyn ApiTransport> = jobs.clone();

    let services = Services {
        runner: services::runner(transport, Arc::new(ProjectProtocol)),
        narration: None,
        characters: Arc::new(CharacterLibrary::new(characters, hosts.clone())),
        hosts,
        fetcher: Arc::new(StaticFetcher { bytes: download }),
        followups: followups.clone(),
        poll_interval: Duration::from_millis(1),
        upload_limit_bytes: 1024,
    };

    Harness {
        services: Arc::new(services),
        followups,
        jobs,
    }
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn test_config() -> BotConfig {
    let public_key = hex::encode(signing_key().verifying_key().to_bytes());
    BotConfig::from_lookup(move |key| match key {
        "DISCORD_APPLICATION_ID" => Some("app1".into()),
        "DISCORD_PUBLIC_KEY" => Some(public_key.clone()),
        "DISCORD_BOT_TOKEN" => Some("bot-token".into()),
        "MAGIC_HOUR_API_KEY" => Some("mh-key".into()),
        _ => None,
    })
    .expect("test config is valid")
}

pub fn test_state(harness: &Harness) -> AppState {
    let config = test_config();
    let verifier = SignatureVerifier::from_hex(&config.discord.public_key).unwrap();
    AppState {
        config: Arc::new(config),
        verifier: Arc::new(verifier),
        services: Arc::clone(&harness.services),
        tasks: TaskTracker::new(),
        shutdown: CancellationToken::new(),
    }
}

pub fn build_test_app(state: AppState) -> Router {
    routes::build_router(state)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub fn signed_interaction(body: &Value) -> Request<Body> {
    let body = body.to_string();
    let mut message = TEST_TIMESTAMP.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    let signature = hex::encode(signing_key().sign(&message).to_bytes());

    Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("content-type", "application/json")
        .header("x-signature-ed25519", signature)
        .header("x-signature-timestamp", TEST_TIMESTAMP)
        .body(Body::from(body))
        .unwrap()
}

pub fn command_interaction(name: &str, options: Value) -> Value {
    json!({
        "id": "int_1",
        "application_id": "app1",
        "type": 2,
        "token": "interaction-token",
        "member": { "user": { "id": "user_1" } },
        "data": { "name": name, "options": options },
    })
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
