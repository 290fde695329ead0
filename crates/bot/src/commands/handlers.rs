//! Background execution of accepted commands.
//!
//! Each command runs on its own task after the interaction was deferred:
//! resolve inputs, submit and watch the job while a progress follow-up is
//! kept current, then post the result as a separate follow-up. Failures are
//! reported to the user; cancellation (shutdown) is only logged.

use std::sync::Arc;

use reelbot_core::asset::{locate_asset, Asset, AssetError};
use reelbot_core::job::JobKind;
use reelbot_core::job_error::{CompletedJob, JobError};
use reelbot_pipeline::narration::NarrationError;
use reelbot_pipeline::progress::ProgressReporter;
use reelbot_providers::magichour::{self, AnimationRequest};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{Command, ImageSource};
use crate::discord::interaction::{Embed, FileUpload, MessagePayload};
use crate::discord::sink::FollowupSink;
use crate::render::{self, MAX_CONTENT_CHARS};
use crate::services::Services;

pub const NARRATION_DISABLED: &str = "Narrated videos are not configured on this bot.";

/// Who asked, and where to answer.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Interaction token used for follow-ups.
    pub token: String,
    pub user_id: Option<String>,
}

/// A follow-up ready to send.
#[derive(Debug, Clone)]
pub struct Reply {
    pub payload: MessagePayload,
    pub files: Vec<FileUpload>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            payload: MessagePayload::text(content),
            files: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            payload: MessagePayload::embed(embed),
            files: Vec::new(),
        }
    }

    pub fn attachment(embed: Embed, filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            payload: MessagePayload::embed(embed),
            files: vec![FileUpload {
                filename: filename.to_string(),
                bytes,
            }],
        }
    }
}

enum Outcome {
    Send(Reply),
    /// Nothing to tell the user (the watch was cancelled).
    Silent,
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Outcome::Send(reply)
    }
}

/// One job to submit for a command.
struct JobRequest {
    kind: JobKind,
    params: Value,
    /// Lines shown under the status in the progress message.
    context: Vec<String>,
    failure_prefix: &'static str,
}

/// How a finished job is shown.
struct Presentation {
    title: &'static str,
    description: Option<String>,
    thumbnail: Option<String>,
    /// Opening of the "couldn't get download URL" message.
    done_text: &'static str,
    file_name: &'static str,
    /// Download URL results and attach them under this title and
    /// description instead of linking.
    attach_as: Option<(&'static str, String)>,
}

impl Presentation {
    fn link(title: &'static str, done_text: &'static str) -> Self {
        Self {
            title,
            description: None,
            thumbnail: None,
            done_text,
            file_name: "video.mp4",
            attach_as: None,
        }
    }

    fn described(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    fn thumbnail(mut self, url: &str) -> Self {
        self.thumbnail = Some(url.to_string());
        self
    }
}

/// Run `command` to completion and post its outcome.
pub async fn execute(
    services: Arc<Services>,
    ctx: CommandContext,
    command: Command,
    cancel: CancellationToken,
) {
    let kind = command.kind();
    tracing::info!(
        kind = kind.map(JobKind::as_str),
        user_id = ctx.user_id.as_deref(),
        "Command started"
    );

    let outcome = match command {
        Command::TextToVideo { prompt, seconds } => {
            let job = JobRequest {
                kind: JobKind::TextToVideo,
                params: magichour::text_to_video(&prompt, seconds),
                context: prompt_context(&prompt),
                failure_prefix: "Failed to generate video",
            };
            let view = Presentation::link("Text to Video", "Video generated")
                .described(format!("**Prompt:** {prompt}"));
            run_job(&services, &ctx, job, view, &cancel).await
        }
        Command::ImageToVideo {
            image_url,
            prompt,
            seconds,
        } => {
            let job = JobRequest {
                kind: JobKind::ImageToVideo,
                params: magichour::image_to_video(&image_url, &prompt, seconds),
                context: prompt_context(&prompt),
                failure_prefix: "Failed to generate video",
            };
            let view = Presentation::link("Image to Video", "Video generated").thumbnail(&image_url);
            run_job(&services, &ctx, job, view, &cancel).await
        }
        Command::FaceSwap {
            video_url,
            face_image_url,
        } => {
            let job = JobRequest {
                kind: JobKind::FaceSwap,
                params: magichour::face_swap(&video_url, &face_image_url),
                context: Vec::new(),
                failure_prefix: "Failed to swap face",
            };
            let view = Presentation::link("Face Swap", "Face swap completed");
            run_job(&services, &ctx, job, view, &cancel).await
        }
        Command::Animate {
            prompt,
            image,
            art_style,
            seconds,
        } => animate(&services, &ctx, prompt, image, art_style, seconds, &cancel).await,
        Command::LipSync {
            video_url,
            audio_url,
        } => {
            let job = JobRequest {
                kind: JobKind::LipSync,
                params: magichour::lip_sync(&video_url, &audio_url),
                context: Vec::new(),
                failure_prefix: "Failed to lip sync",
            };
            let view = Presentation::link("Lip Sync", "Lip sync completed");
            run_job(&services, &ctx, job, view, &cancel).await
        }
        Command::TalkingPhoto { image, audio_url } => {
            const PREFIX: &str = "Failed to create talking photo";
            match resolve_image(&services, image).await {
                Ok(image_url) => {
                    let job = JobRequest {
                        kind: JobKind::TalkingPhoto,
                        params: magichour::talking_photo(&image_url, &audio_url),
                        context: Vec::new(),
                        failure_prefix: PREFIX,
                    };
                    let view = Presentation::link("Talking Photo", "Talking photo created")
                        .thumbnail(&image_url);
                    run_job(&services, &ctx, job, view, &cancel).await
                }
                Err(reason) => Reply::text(render::failure_message(PREFIX, &reason)).into(),
            }
        }
        Command::Narrate { topic } => narrate(&services, &ctx, &topic, &cancel).await,
        Command::Help => Reply::embed(render::help_embed()).into(),
    };

    match outcome {
        Outcome::Send(reply) => send(&services, &ctx, reply).await,
        Outcome::Silent => {
            tracing::info!(kind = kind.map(JobKind::as_str), "Command cancelled before completion");
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run_job(
    services: &Services,
    ctx: &CommandContext,
    job: JobRequest,
    view: Presentation,
    cancel: &CancellationToken,
) -> Outcome {
    let kind = job.kind;
    let mut reporter = reporter(services, ctx, kind.label(), job.context);
    let result = services
        .runner
        .run(kind, &job.params, &services.watch_config(kind), &mut reporter, cancel)
        .await;

    match result {
        Ok(done) => deliver(services, &done, view).await.into(),
        Err(JobError::Cancelled) => Outcome::Silent,
        Err(e) => {
            tracing::warn!(kind = kind.as_str(), code = e.code(), error = %e, "Job failed");
            Reply::text(render::failure_message(job.failure_prefix, &e)).into()
        }
    }
}

async fn animate(
    services: &Services,
    ctx: &CommandContext,
    prompt: String,
    image: Option<ImageSource>,
    art_style: &'static str,
    seconds: u32,
    cancel: &CancellationToken,
) -> Outcome {
    const PREFIX: &str = "❌ Failed to animate";

    let image_url = match image {
        Some(image) => match resolve_image(services, image).await {
            Ok(url) => Some(url),
            Err(reason) => return Reply::text(render::failure_message(PREFIX, &reason)).into(),
        },
        None => None,
    };

    let job = JobRequest {
        kind: JobKind::Animation,
        params: magichour::animation(&AnimationRequest {
            prompt: &prompt,
            image_url: image_url.as_deref(),
            art_style,
            seconds,
        }),
        context: vec![format!("**Prompt:** {prompt}")],
        failure_prefix: PREFIX,
    };
    let mut view = Presentation::link("Animation", "Animation completed")
        .described(format!("**Prompt:** {prompt}"));
    view.file_name = "animation.mp4";
    view.attach_as = Some((
        "✨ Animation Complete!",
        format!("**Prompt:** {prompt}\n**Style:** {art_style}"),
    ));

    run_job(services, ctx, job, view, cancel).await
}

async fn narrate(
    services: &Services,
    ctx: &CommandContext,
    topic: &str,
    cancel: &CancellationToken,
) -> Outcome {
    const PREFIX: &str = "Failed to create narrated video";

    let Some(pipeline) = &services.narration else {
        return Reply::text(NARRATION_DISABLED).into();
    };

    let context = vec![format!("**Topic:** {topic}")];
    let mut reporter = reporter(services, ctx, "Narrated Video", context);

    match pipeline.run(topic, &mut reporter, cancel).await {
        Ok(video) => {
            let description = format!(
                "**Topic:** {topic}\n\n{}",
                render::truncate(&video.script.narration, MAX_CONTENT_CHARS)
            );
            publish_bytes(services, "🎓 Narrated Video", description, "narrated.mp4", video.bytes)
                .await
                .into()
        }
        Err(NarrationError::Job(JobError::Cancelled)) => Outcome::Silent,
        Err(e) => {
            tracing::warn!(topic, error = %e, "Narration failed");
            Reply::text(render::failure_message(PREFIX, &e)).into()
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

async fn deliver(services: &Services, done: &CompletedJob, view: Presentation) -> Reply {
    let asset = match locate_asset(&done.payload) {
        Ok(asset) => asset,
        Err(AssetError::Missing) => {
            tracing::warn!(job_id = %done.id, "Completed job has no download URL");
            return Reply::text(render::missing_url_message(view.done_text, &done.payload));
        }
        Err(e) => {
            let message = format!("{} but the result could not be read", view.done_text);
            return Reply::text(render::failure_message(&message, &e));
        }
    };

    match asset {
        Asset::Url(url) => {
            if let Some((title, description)) = &view.attach_as {
                match services.fetcher.fetch(&url).await {
                    Ok(bytes) => {
                        return Reply::attachment(
                            render::attached_embed(title, description.clone()),
                            view.file_name,
                            bytes,
                        );
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %done.id, error = %e, "Result not attached, linking instead");
                    }
                }
            }
            Reply::embed(render::link_embed(
                view.title,
                view.description,
                &url,
                view.thumbnail.as_deref(),
            ))
        }
        Asset::Inline { bytes, .. } => {
            let (title, description) = view
                .attach_as
                .unwrap_or((view.title, view.description.unwrap_or_default()));
            publish_bytes(services, title, description, view.file_name, bytes).await
        }
    }
}

/// Attach `bytes` when they fit the upload limit, otherwise host them and
/// link the public URL.
async fn publish_bytes(
    services: &Services,
    title: &str,
    description: String,
    file_name: &str,
    bytes: Vec<u8>,
) -> Reply {
    if bytes.len() as u64 <= services.upload_limit_bytes {
        return Reply::attachment(render::attached_embed(title, description), file_name, bytes);
    }

    match services.hosts.publish(file_name, &bytes).await {
        Ok(hosted) => Reply::embed(render::link_embed(title, Some(description), &hosted.url, None)),
        Err(e) => {
            tracing::warn!(file_name, size = bytes.len(), error = %e, "Oversized result could not be hosted");
            Reply::text(render::failure_message("Video is too large to attach", &e))
        }
    }
}

// ---- private helpers ----

fn reporter(
    services: &Services,
    ctx: &CommandContext,
    label: &str,
    context: Vec<String>,
) -> ProgressReporter<FollowupSink> {
    let sink = FollowupSink::new(Arc::clone(&services.followups), ctx.token.clone());
    ProgressReporter::new(sink, format!("{label} in Progress"), context)
}

fn prompt_context(prompt: &str) -> Vec<String> {
    if prompt.is_empty() {
        Vec::new()
    } else {
        vec![format!("**Prompt:** {prompt}")]
    }
}

/// Public URL for an image input; the error is the user-facing reason.
async fn resolve_image(services: &Services, image: ImageSource) -> Result<String, String> {
    match image {
        ImageSource::Url(url) => Ok(url),
        ImageSource::Character(name) => services.characters.resolve(&name).await.map_err(|e| {
            tracing::warn!(character = %name, error = %e, "Character not resolved");
            e.to_string()
        }),
    }
}

async fn send(services: &Services, ctx: &CommandContext, reply: Reply) {
    let attached = reply.files.len();
    if let Err(e) = services
        .followups
        .create_followup(&ctx.token, &reply.payload, reply.files)
        .await
    {
        tracing::error!(error = %e, attached, "Failed to post command result");
    }
}
