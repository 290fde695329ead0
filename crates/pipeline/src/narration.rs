//! Narrated video workflow: script, speech and footage muxed into one file.
//!
//! The footage is a long-running-operation job run through the same
//! [`JobRunner`] as every other command; speech synthesis runs concurrently
//! with it. The language model, speech engine and muxer are traits so the
//! workflow is testable without any of them.

use std::sync::Arc;

use async_trait::async_trait;
use reelbot_core::asset::{locate_asset, AssetError};
use reelbot_core::job::JobKind;
use reelbot_core::job_error::JobError;
use reelbot_core::status::ColorState;
use reelbot_core::types::JobId;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::media::{materialize, AssetFetcher, FetchError};
use crate::progress::{NotificationSink, ProgressReporter};
use crate::runner::JobRunner;
use crate::watcher::{StatusListener, WatchConfig};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// What the language model produced for a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Text read aloud over the footage.
    pub narration: String,
    /// Prompt for the footage itself.
    pub visual_prompt: String,
}

/// A content provider (LLM, speech engine, muxer) failed.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("media processing failed: {0}")]
    Process(String),
}

#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write_script(&self, topic: &str) -> Result<Script, ContentError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Encoded audio for `text`.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ContentError>;
}

#[async_trait]
pub trait MediaCombiner: Send + Sync {
    /// Lay `audio` over `video`, looping the video to the audio's length.
    async fn combine(&self, video: &[u8], audio: &[u8]) -> Result<Vec<u8>, ContentError>;
}

/// Builds the footage job's creation body from a visual prompt.
pub type RequestBuilder = Arc<dyn Fn(&str) -> Value + Send + Sync>;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Workflow steps that happen outside the footage job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationStage {
    WritingScript,
    RenderingMedia,
    Combining,
}

impl NarrationStage {
    pub fn label(self) -> &'static str {
        match self {
            NarrationStage::WritingScript => "📝 **Writing** - Drafting the narration...",
            NarrationStage::RenderingMedia => "🎙️ **Recording** - Generating voice and footage...",
            NarrationStage::Combining => "🎞️ **Combining** - Merging voice and footage...",
        }
    }
}

/// A [`StatusListener`] that also hears about workflow stages.
#[async_trait]
pub trait StageListener: StatusListener {
    async fn on_stage(&mut self, _stage: NarrationStage) {}
}

#[async_trait]
impl StageListener for () {}

#[async_trait]
impl<S: NotificationSink> StageListener for ProgressReporter<S> {
    async fn on_stage(&mut self, stage: NarrationStage) {
        let update = self.render(stage.label(), ColorState::InProgress);
        self.update(&update).await;
    }
}

// ---------------------------------------------------------------------------
// Errors and output
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("Script generation failed: {0}")]
    Script(#[source] ContentError),

    #[error("Speech generation failed: {0}")]
    Speech(#[source] ContentError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Could not locate the generated video: {0}")]
    Asset(#[from] AssetError),

    #[error("Could not download the generated video: {0}")]
    Fetch(#[from] FetchError),

    #[error("Combining audio and video failed: {0}")]
    Combine(#[source] ContentError),
}

#[derive(Debug, Clone)]
pub struct NarratedVideo {
    pub script: Script,
    /// Identifier of the footage job.
    pub job_id: JobId,
    /// Muxed MP4.
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// NarrationPipeline
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct NarrationPipeline {
    writer: Arc<dyn ScriptWriter>,
    speech: Arc<dyn SpeechSynthesizer>,
    combiner: Arc<dyn MediaCombiner>,
    fetcher: Arc<dyn AssetFetcher>,
    runner: JobRunner,
    request: RequestBuilder,
    watch: WatchConfig,
}

impl NarrationPipeline {
    pub fn new(
        writer: Arc<dyn ScriptWriter>,
        speech: Arc<dyn SpeechSynthesizer>,
        combiner: Arc<dyn MediaCombiner>,
        fetcher: Arc<dyn AssetFetcher>,
        runner: JobRunner,
        request: RequestBuilder,
        watch: WatchConfig,
    ) -> Self {
        Self {
            writer,
            speech,
            combiner,
            fetcher,
            runner,
            request,
            watch,
        }
    }

    /// Produce a narrated video about `topic`.
    pub async fn run<L>(
        &self,
        topic: &str,
        listener: &mut L,
        cancel: &CancellationToken,
    ) -> Result<NarratedVideo, NarrationError>
    where
        L: StageListener + ?Sized,
    {
        listener.on_stage(NarrationStage::WritingScript).await;
        let script = self
            .writer
            .write_script(topic)
            .await
            .map_err(NarrationError::Script)?;
        tracing::debug!(topic, chars = script.narration.len(), "Narration script written");

        listener.on_stage(NarrationStage::RenderingMedia).await;
        let body = (self.request)(&script.visual_prompt);
        let (audio, footage) = tokio::join!(
            self.speech.synthesize(&script.narration),
            self.runner.run(
                JobKind::LongRunningOperation,
                &body,
                &self.watch,
                &mut *listener,
                cancel,
            ),
        );
        let footage = footage?;
        let audio = audio.map_err(NarrationError::Speech)?;

        let asset = locate_asset(&footage.payload)?;
        let video = materialize(asset, self.fetcher.as_ref()).await?;

        listener.on_stage(NarrationStage::Combining).await;
        let bytes = self
            .combiner
            .combine(&video, &audio)
            .await
            .map_err(NarrationError::Combine)?;

        tracing::info!(job_id = %footage.id, size = bytes.len(), "Narrated video ready");
        Ok(NarratedVideo {
            script,
            job_id: footage.id,
            bytes,
        })
    }
}
