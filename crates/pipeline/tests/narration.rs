//! Integration tests for the narrated video workflow.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use common::{fast_config, ScriptedTransport};
use reelbot_core::job_error::JobError;
use reelbot_pipeline::media::{AssetFetcher, FetchError};
use reelbot_pipeline::narration::{
    ContentError, MediaCombiner, NarrationError, NarrationPipeline, NarrationStage, Script,
    ScriptWriter, SpeechSynthesizer, StageListener,
};
use reelbot_pipeline::protocol::OperationProtocol;
use reelbot_pipeline::runner::JobRunner;
use reelbot_pipeline::submitter::JobSubmitter;
use reelbot_pipeline::transport::RawResponse;
use reelbot_pipeline::watcher::{JobWatcher, StatusChange, StatusListener};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FixedWriter;

#[async_trait]
impl ScriptWriter for FixedWriter {
    async fn write_script(&self, topic: &str) -> Result<Script, ContentError> {
        Ok(Script {
            narration: format!("All about {topic}."),
            visual_prompt: format!("Educational visuals of {topic}"),
        })
    }
}

struct FailingWriter;

#[async_trait]
impl ScriptWriter for FailingWriter {
    async fn write_script(&self, _topic: &str) -> Result<Script, ContentError> {
        Err(ContentError::HttpStatus {
            status: 429,
            body: "rate limited".into(),
        })
    }
}

struct EchoSpeech;

#[async_trait]
impl SpeechSynthesizer for EchoSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ContentError> {
        Ok(text.as_bytes().to_vec())
    }
}

/// Joins video and audio with a `|` so the test can see both inputs.
struct JoinCombiner;

#[async_trait]
impl MediaCombiner for JoinCombiner {
    async fn combine(&self, video: &[u8], audio: &[u8]) -> Result<Vec<u8>, ContentError> {
        Ok([video, &b"|"[..], audio].concat())
    }
}

struct StaticFetcher;

#[async_trait]
impl AssetFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(b"VIDEO".to_vec())
    }
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

#[async_trait]
impl StatusListener for Recorder {
    async fn on_status_change(&mut self, change: &StatusChange) {
        self.events.push(format!("status:{}", change.status));
    }
}

#[async_trait]
impl StageListener for Recorder {
    async fn on_stage(&mut self, stage: NarrationStage) {
        self.events.push(format!("stage:{stage:?}"));
    }
}

fn pipeline(writer: Arc<dyn ScriptWriter>, transport: Arc<ScriptedTransport>) -> NarrationPipeline {
    let protocol = Arc::new(OperationProtocol::new("/models/veo:predictLongRunning"));
    let runner = JobRunner::new(
        JobSubmitter::new(transport.clone(), protocol.clone()),
        JobWatcher::new(transport, protocol),
    );
    NarrationPipeline::new(
        writer,
        Arc::new(EchoSpeech),
        Arc::new(JoinCombiner),
        Arc::new(StaticFetcher),
        runner,
        Arc::new(|prompt: &str| -> Value { json!({ "instances": [{ "prompt": prompt }] }) }),
        fast_config(120),
    )
}

fn finished_operation() -> ScriptedTransport {
    ScriptedTransport::new()
        .with_create(RawResponse::new(200, json!({ "name": "operations/n-1" })))
        .with_poll(RawResponse::new(200, json!({ "done": false })))
        .with_poll(RawResponse::new(
            200,
            json!({
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [{ "video": { "uri": "https://files.example/v.mp4" } }]
                    }
                }
            }),
        ))
}

// ---------------------------------------------------------------------------
// Test: full workflow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn narrated_video_combines_speech_and_footage() {
    let transport = finished_operation().into_arc();
    let pipeline = pipeline(Arc::new(FixedWriter), transport);
    let mut recorder = Recorder::default();

    let video = pipeline
        .run("gravity", &mut recorder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(video.bytes, b"VIDEO|All about gravity.".to_vec());
    assert_eq!(video.job_id.as_str(), "operations/n-1");
    assert_eq!(video.script.visual_prompt, "Educational visuals of gravity");
    assert_eq!(
        recorder.events,
        vec![
            "stage:WritingScript",
            "stage:RenderingMedia",
            "status:rendering",
            "status:complete",
            "stage:Combining",
        ]
    );
}

// ---------------------------------------------------------------------------
// Test: failures surface with their stage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn script_failure_stops_before_any_job() {
    let transport = finished_operation().into_arc();
    let pipeline = pipeline(Arc::new(FailingWriter), transport.clone());

    let result = pipeline
        .run("gravity", &mut (), &CancellationToken::new())
        .await;

    assert_matches!(result, Err(NarrationError::Script(ContentError::HttpStatus { status: 429, .. })));
    assert!(transport.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn footage_failure_is_a_job_error() {
    let transport = ScriptedTransport::new()
        .with_create(RawResponse::new(200, json!({ "name": "operations/n-2" })))
        .with_poll(RawResponse::new(
            200,
            json!({ "done": true, "error": { "message": "Safety filter" } }),
        ))
        .into_arc();
    let pipeline = pipeline(Arc::new(FixedWriter), transport);

    let result = pipeline
        .run("gravity", &mut (), &CancellationToken::new())
        .await;

    assert_matches!(result, Err(NarrationError::Job(JobError::GenerationFailure(ref d))) if d == "Safety filter");
}

#[tokio::test]
async fn footage_without_asset_is_reported() {
    let transport = ScriptedTransport::new()
        .with_create(RawResponse::new(200, json!({ "name": "operations/n-3" })))
        .with_poll(RawResponse::new(200, json!({ "done": true, "response": {} })))
        .into_arc();
    let pipeline = pipeline(Arc::new(FixedWriter), transport);

    let result = pipeline
        .run("gravity", &mut (), &CancellationToken::new())
        .await;

    assert_matches!(result, Err(NarrationError::Asset(_)));
}
