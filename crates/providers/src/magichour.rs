//! Request bodies for the Magic Hour media-job API.
//!
//! Each builder returns the JSON body for one creation endpoint; the
//! endpoint itself comes from [`reelbot_pipeline::protocol::ProjectProtocol`].

use serde::Serialize;
use serde_json::Value;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.magichour.ai/v1";

/// Default clip length for text/image-to-video, in seconds.
pub const DEFAULT_VIDEO_SECONDS: u32 = 5;

/// Default clip length for animations, in seconds.
pub const DEFAULT_ANIMATION_SECONDS: u32 = 3;

pub const DEFAULT_ART_STYLE: &str = "Photograph";

/// Art styles offered to users as `(label, api value)`.
pub const ART_STYLES: &[(&str, &str)] = &[
    ("Photograph", "Photograph"),
    ("3D Render", "3D Render"),
    ("Cyberpunk", "Cyberpunk"),
    ("Studio Ghibli", "Studio Ghibli Film Still"),
    ("Oil Painting", "Oil Painting"),
    ("Pixel Art", "Pixel Art"),
    ("Anime", "Futuristic Anime"),
    ("Fantasy", "Fantasy"),
];

const ANIMATION_FPS: u32 = 8;
const ANIMATION_SIZE: u32 = 576;
const ANIMATION_CAMERA_EFFECT: &str = "Simple Zoom In";
const ANIMATION_TRANSITION_SPEED: u32 = 5;

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PromptStyle<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct TextToVideo<'a> {
    end_seconds: u32,
    style: PromptStyle<'a>,
}

#[derive(Debug, Serialize)]
struct ImageToVideo<'a> {
    end_seconds: u32,
    assets: ImageAssets<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<PromptStyle<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageAssets<'a> {
    image_file_path: &'a str,
}

#[derive(Debug, Serialize)]
struct FaceSwapAssets<'a> {
    video_url: &'a str,
    face_image_url: &'a str,
}

#[derive(Debug, Serialize)]
struct LipSyncAssets<'a> {
    video_url: &'a str,
    audio_url: &'a str,
}

#[derive(Debug, Serialize)]
struct TalkingPhotoAssets<'a> {
    image_url: &'a str,
    audio_url: &'a str,
}

#[derive(Debug, Serialize)]
struct WithAssets<T> {
    assets: T,
}

#[derive(Debug, Serialize)]
struct Animation<'a> {
    fps: u32,
    end_seconds: u32,
    height: u32,
    width: u32,
    style: AnimationStyle<'a>,
    assets: AnimationAssets<'a>,
}

#[derive(Debug, Serialize)]
struct AnimationStyle<'a> {
    art_style: &'a str,
    camera_effect: &'a str,
    prompt_type: &'static str,
    prompt: &'a str,
    transition_speed: u32,
}

#[derive(Debug, Serialize)]
struct AnimationAssets<'a> {
    audio_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_file_path: Option<&'a str>,
}

/// Parameters for an animation job.
#[derive(Debug, Clone)]
pub struct AnimationRequest<'a> {
    pub prompt: &'a str,
    pub image_url: Option<&'a str>,
    pub art_style: &'a str,
    pub seconds: u32,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn text_to_video(prompt: &str, seconds: u32) -> Value {
    to_value(&TextToVideo {
        end_seconds: seconds,
        style: PromptStyle { prompt },
    })
}

/// An empty `prompt` leaves the motion up to the service.
pub fn image_to_video(image_url: &str, prompt: &str, seconds: u32) -> Value {
    to_value(&ImageToVideo {
        end_seconds: seconds,
        assets: ImageAssets {
            image_file_path: image_url,
        },
        style: (!prompt.trim().is_empty()).then_some(PromptStyle { prompt }),
    })
}

pub fn face_swap(video_url: &str, face_image_url: &str) -> Value {
    to_value(&WithAssets {
        assets: FaceSwapAssets {
            video_url,
            face_image_url,
        },
    })
}

pub fn animation(request: &AnimationRequest<'_>) -> Value {
    to_value(&Animation {
        fps: ANIMATION_FPS,
        end_seconds: request.seconds,
        height: ANIMATION_SIZE,
        width: ANIMATION_SIZE,
        style: AnimationStyle {
            art_style: request.art_style,
            camera_effect: ANIMATION_CAMERA_EFFECT,
            prompt_type: "custom",
            prompt: request.prompt,
            transition_speed: ANIMATION_TRANSITION_SPEED,
        },
        assets: AnimationAssets {
            audio_source: "none",
            image_file_path: request.image_url,
        },
    })
}

pub fn lip_sync(video_url: &str, audio_url: &str) -> Value {
    to_value(&WithAssets {
        assets: LipSyncAssets {
            video_url,
            audio_url,
        },
    })
}

pub fn talking_photo(image_url: &str, audio_url: &str) -> Value {
    to_value(&WithAssets {
        assets: TalkingPhotoAssets {
            image_url,
            audio_url,
        },
    })
}

/// API value for a user-facing art style label, accepting the API value
/// itself too.
pub fn resolve_art_style(input: &str) -> Option<&'static str> {
    ART_STYLES
        .iter()
        .find(|(label, value)| label.eq_ignore_ascii_case(input) || value.eq_ignore_ascii_case(input))
        .map(|(_, value)| *value)
}

fn to_value<T: Serialize>(body: &T) -> Value {
    // Only plain structs of strings and integers reach here.
    serde_json::to_value(body).unwrap_or(Value::Null)
}
