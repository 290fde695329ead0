//! Integration tests for command execution: progress follow-ups, result
//! delivery and failure reporting, all against in-memory services.

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reelbot_bot::commands::handlers::{self, CommandContext, NARRATION_DISABLED};
use reelbot_bot::commands::{Command, ImageSource};
use reelbot_core::status::{LABEL_COMPLETE, LABEL_QUEUED};
use reelbot_pipeline::transport::RawResponse;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::{harness, FakeJobService, Followup, Harness};

fn ctx() -> CommandContext {
    CommandContext {
        token: "interaction-token".into(),
        user_id: Some("user_1".into()),
    }
}

async fn execute(harness: &Harness, command: Command) {
    handlers::execute(
        harness.services.clone(),
        ctx(),
        command,
        CancellationToken::new(),
    )
    .await;
}

fn text_to_video() -> Command {
    Command::TextToVideo {
        prompt: "a red fox".into(),
        seconds: 5,
    }
}

fn animate(image: Option<ImageSource>) -> Command {
    Command::Animate {
        prompt: "a lighthouse".into(),
        image,
        art_style: "Photograph",
        seconds: 3,
    }
}

// ---------------------------------------------------------------------------
// Test: progress message is created once, edited, then the result follows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_then_separate_result() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = FakeJobService::completing(json!({ "video_url": "https://cdn.test/v.mp4" }));
    let harness = harness(jobs, None, dir.path());

    execute(&harness, text_to_video()).await;

    let calls = harness.followups.calls();
    assert_eq!(calls.len(), 3);

    match &calls[0] {
        Followup::Created { payload, .. } => {
            let embed = &payload.embeds[0];
            assert_eq!(embed.title.as_deref(), Some("Text to Video in Progress"));
            assert_eq!(
                embed.description.as_deref(),
                Some(format!("{LABEL_QUEUED}\n**Prompt:** a red fox").as_str())
            );
            assert_eq!(embed.color, Some(0xffa500));
        }
        other => panic!("expected progress message, got {other:?}"),
    }
    match &calls[1] {
        Followup::Edited {
            message_id,
            payload,
        } => {
            assert_eq!(message_id, "1");
            assert!(payload.embeds[0]
                .description
                .as_deref()
                .unwrap()
                .starts_with(LABEL_COMPLETE));
        }
        other => panic!("expected progress edit, got {other:?}"),
    }

    let (result, _) = harness.followups.result();
    assert_eq!(result.embeds[0].title.as_deref(), Some("Text to Video"));
    assert_eq!(
        result.embeds[0].fields[0].value,
        "[Download Video](https://cdn.test/v.mp4)"
    );
}

// ---------------------------------------------------------------------------
// Test: animations are downloaded and attached
// ---------------------------------------------------------------------------

#[tokio::test]
async fn animation_is_attached() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = FakeJobService::completing(json!({
        "downloads": [{ "url": "https://cdn.test/anim.mp4" }]
    }));
    let harness = harness(jobs, Some(vec![0u8; 64]), dir.path());

    execute(&harness, animate(None)).await;

    let (result, files) = harness.followups.result();
    assert_eq!(files, vec!["animation.mp4".to_string()]);
    assert_eq!(result.embeds[0].title.as_deref(), Some("✨ Animation Complete!"));
    assert_eq!(
        result.embeds[0].description.as_deref(),
        Some("**Prompt:** a lighthouse\n**Style:** Photograph")
    );
}

#[tokio::test]
async fn failed_download_falls_back_to_link() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = FakeJobService::completing(json!({
        "downloads": [{ "url": "https://cdn.test/anim.mp4" }]
    }));
    let harness = harness(jobs, None, dir.path());

    execute(&harness, animate(None)).await;

    let (result, files) = harness.followups.result();
    assert!(files.is_empty());
    assert_eq!(result.embeds[0].title.as_deref(), Some("Animation"));
    assert_eq!(
        result.embeds[0].fields[0].value,
        "[Download Video](https://cdn.test/anim.mp4)"
    );
}

// ---------------------------------------------------------------------------
// Test: failures and missing URLs are reported as text
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generation_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = FakeJobService::new(
        RawResponse::new(200, json!({ "id": "proj_1" })),
        vec![RawResponse::new(
            200,
            json!({ "id": "proj_1", "status": "error", "error": { "message": "no face found" } }),
        )],
    );
    let harness = harness(jobs, None, dir.path());

    execute(
        &harness,
        Command::FaceSwap {
            video_url: "https://x/v.mp4".into(),
            face_image_url: "https://x/f.png".into(),
        },
    )
    .await;

    let (result, _) = harness.followups.result();
    assert_eq!(
        result.content.as_deref(),
        Some("Failed to swap face: Generation failed: no face found")
    );
}

#[tokio::test]
async fn rejected_submission_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = FakeJobService::new(
        RawResponse::new(422, json!({ "message": "end_seconds too large" })),
        Vec::new(),
    );
    let harness = harness(jobs, None, dir.path());

    execute(&harness, text_to_video()).await;

    assert_eq!(harness.followups.calls().len(), 1);
    let (result, _) = harness.followups.result();
    assert_eq!(
        result.content.as_deref(),
        Some("Failed to generate video: API Error (422): end_seconds too large")
    );
}

#[tokio::test]
async fn missing_url_shows_raw_response() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(FakeJobService::completing(json!({})), None, dir.path());

    execute(
        &harness,
        Command::LipSync {
            video_url: "https://x/v.mp4".into(),
            audio_url: "https://x/a.mp3".into(),
        },
    )
    .await;

    let (result, _) = harness.followups.result();
    let content = result.content.unwrap();
    assert!(content.starts_with("Lip sync completed but couldn't get download URL. Response: {"));
    assert!(content.contains("\"status\":\"complete\""));
}

// ---------------------------------------------------------------------------
// Test: inline results over the upload limit are hosted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oversized_inline_result_is_hosted() {
    let dir = tempfile::tempdir().unwrap();
    let encoded = STANDARD.encode(vec![1u8; 4096]);
    let jobs = FakeJobService::completing(json!({ "bytesBase64Encoded": encoded }));
    let harness = harness(jobs, None, dir.path());

    execute(&harness, text_to_video()).await;

    let (result, files) = harness.followups.result();
    assert!(files.is_empty());
    assert_eq!(
        result.embeds[0].fields[0].value,
        "[Download Video](https://files.test/video.mp4)"
    );
}

// ---------------------------------------------------------------------------
// Test: characters resolve to hosted URLs before submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn character_image_is_published_and_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("nova.png"), b"png").unwrap();
    let jobs = FakeJobService::completing(json!({ "video_url": "https://cdn.test/t.mp4" }));
    let harness = harness(jobs, None, dir.path());

    execute(
        &harness,
        Command::TalkingPhoto {
            image: ImageSource::Character("nova".into()),
            audio_url: "https://x/a.mp3".into(),
        },
    )
    .await;

    let (path, body) = harness.jobs.requests()[0].clone();
    assert_eq!(path, "POST /ai-talking-photo");
    assert_eq!(body["assets"]["image_url"], "https://files.test/nova.png");
    assert_eq!(harness.services.characters.cache().len().await, 1);
}

#[tokio::test]
async fn unknown_character_is_reported_without_a_job() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(FakeJobService::completing(json!({})), None, dir.path());

    execute(&harness, animate(Some(ImageSource::Character("ghost".into())))).await;

    let (result, _) = harness.followups.result();
    assert_eq!(
        result.content.as_deref(),
        Some("❌ Failed to animate: Character 'ghost' not found")
    );
    assert!(harness.jobs.requests().is_empty());
}

// ---------------------------------------------------------------------------
// Test: narration without configuration, and cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn narration_without_config_says_so() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(FakeJobService::completing(json!({})), None, dir.path());

    execute(
        &harness,
        Command::Narrate {
            topic: "photosynthesis".into(),
        },
    )
    .await;

    let (result, _) = harness.followups.result();
    assert_eq!(result.content.as_deref(), Some(NARRATION_DISABLED));
}

#[tokio::test]
async fn cancelled_command_posts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(FakeJobService::completing(json!({})), None, dir.path());
    let cancel = CancellationToken::new();
    cancel.cancel();

    handlers::execute(harness.services.clone(), ctx(), text_to_video(), cancel).await;

    assert!(harness.followups.calls().is_empty());
    assert!(harness
        .jobs
        .requests()
        .iter()
        .all(|(path, _)| path.starts_with("POST")));
}
