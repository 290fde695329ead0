//! Slash commands: parsing and validation of interaction options.
//!
//! Every required-field and range check happens here, before a job is
//! submitted, so the pipeline forwards parameters as-is.

pub mod definitions;
pub mod handlers;

use reelbot_core::error::CoreError;
use reelbot_core::job::JobKind;
use reelbot_providers::magichour::{self, DEFAULT_ANIMATION_SECONDS, DEFAULT_VIDEO_SECONDS};

use crate::discord::interaction::CommandData;

pub const MIN_SECONDS: i64 = 1;
pub const MAX_SECONDS: i64 = 60;

/// Where an image comes from: a user URL or a stored character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Character(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TextToVideo {
        prompt: String,
        seconds: u32,
    },
    ImageToVideo {
        image_url: String,
        prompt: String,
        seconds: u32,
    },
    FaceSwap {
        video_url: String,
        face_image_url: String,
    },
    Animate {
        prompt: String,
        image: Option<ImageSource>,
        /// API value, e.g. `"Studio Ghibli Film Still"`.
        art_style: &'static str,
        seconds: u32,
    },
    LipSync {
        video_url: String,
        audio_url: String,
    },
    TalkingPhoto {
        image: ImageSource,
        audio_url: String,
    },
    Narrate {
        topic: String,
    },
    Help,
}

impl Command {
    /// Parse and validate the options of an application command.
    pub fn parse(data: &CommandData) -> Result<Self, CoreError> {
        match data.name.as_str() {
            "text2video" => Ok(Command::TextToVideo {
                prompt: required(data, "prompt")?,
                seconds: seconds(data, DEFAULT_VIDEO_SECONDS)?,
            }),
            "img2video" => Ok(Command::ImageToVideo {
                image_url: url(data, "image_url")?,
                prompt: data.string("prompt").unwrap_or_default(),
                seconds: seconds(data, DEFAULT_VIDEO_SECONDS)?,
            }),
            "faceswap" => Ok(Command::FaceSwap {
                video_url: url(data, "video_url")?,
                face_image_url: url(data, "face_image_url")?,
            }),
            "animate" => {
                let art_style = match data.string("art_style") {
                    None => magichour::DEFAULT_ART_STYLE,
                    Some(style) => magichour::resolve_art_style(&style).ok_or_else(|| {
                        CoreError::Validation(format!("Unknown art style '{style}'"))
                    })?,
                };
                Ok(Command::Animate {
                    prompt: required(data, "prompt")?,
                    image: image_source(data)?,
                    art_style,
                    seconds: seconds(data, DEFAULT_ANIMATION_SECONDS)?,
                })
            }
            "lipsync" => Ok(Command::LipSync {
                video_url: url(data, "video_url")?,
                audio_url: url(data, "audio_url")?,
            }),
            "talkingphoto" => Ok(Command::TalkingPhoto {
                image: image_source(data)?.ok_or_else(|| {
                    CoreError::Validation("Provide either image_url or character".into())
                })?,
                audio_url: url(data, "audio_url")?,
            }),
            "narrate" => Ok(Command::Narrate {
                topic: required(data, "topic")?,
            }),
            "magichelp" => Ok(Command::Help),
            other => Err(CoreError::NotFound {
                entity: "Command",
                id: other.to_string(),
            }),
        }
    }

    /// The job kind this command submits, if it submits one directly.
    pub fn kind(&self) -> Option<JobKind> {
        match self {
            Command::TextToVideo { .. } => Some(JobKind::TextToVideo),
            Command::ImageToVideo { .. } => Some(JobKind::ImageToVideo),
            Command::FaceSwap { .. } => Some(JobKind::FaceSwap),
            Command::Animate { .. } => Some(JobKind::Animation),
            Command::LipSync { .. } => Some(JobKind::LipSync),
            Command::TalkingPhoto { .. } => Some(JobKind::TalkingPhoto),
            Command::Narrate { .. } => Some(JobKind::LongRunningOperation),
            Command::Help => None,
        }
    }
}

// ---- private helpers ----

fn required(data: &CommandData, name: &str) -> Result<String, CoreError> {
    data.string(name)
        .ok_or_else(|| CoreError::Validation(format!("{name} is required")))
}

fn url(data: &CommandData, name: &str) -> Result<String, CoreError> {
    let value = required(data, name)?;
    validate_url(name, &value)?;
    Ok(value)
}

fn validate_url(name: &str, value: &str) -> Result<(), CoreError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{name} must be an http(s) URL"
        )))
    }
}

fn seconds(data: &CommandData, default: u32) -> Result<u32, CoreError> {
    match data.integer("duration") {
        None => Ok(default),
        Some(s) if (MIN_SECONDS..=MAX_SECONDS).contains(&s) => Ok(s as u32),
        Some(s) => Err(CoreError::Validation(format!(
            "duration must be between {MIN_SECONDS} and {MAX_SECONDS} seconds, got {s}"
        ))),
    }
}

/// `image_url` or `character`, never both.
fn image_source(data: &CommandData) -> Result<Option<ImageSource>, CoreError> {
    match (data.string("image_url"), data.string("character")) {
        (Some(_), Some(_)) => Err(CoreError::Validation(
            "Use either image_url or character, not both".into(),
        )),
        (Some(image_url), None) => {
            validate_url("image_url", &image_url)?;
            Ok(Some(ImageSource::Url(image_url)))
        }
        (None, Some(character)) => Ok(Some(ImageSource::Character(character))),
        (None, None) => Ok(None),
    }
}
