//! Registration payload for the global slash commands.

use reelbot_providers::magichour::ART_STYLES;
use serde_json::{json, Value};

use super::{MAX_SECONDS, MIN_SECONDS};

const STRING: u8 = 3;
const INTEGER: u8 = 4;
const CHAT_INPUT: u8 = 1;

fn string_option(name: &str, description: &str, required: bool) -> Value {
    json!({
        "type": STRING,
        "name": name,
        "description": description,
        "required": required,
    })
}

fn duration_option(default: u32) -> Value {
    json!({
        "type": INTEGER,
        "name": "duration",
        "description": format!("Video duration in seconds (default: {default})"),
        "required": false,
        "min_value": MIN_SECONDS,
        "max_value": MAX_SECONDS,
    })
}

fn command(name: &str, description: &str, options: Vec<Value>) -> Value {
    json!({
        "type": CHAT_INPUT,
        "name": name,
        "description": description,
        "options": options,
    })
}

/// Body for `PUT /applications/{id}/commands`.
///
/// `narrate` is only offered when the narration stack is configured.
pub fn all(narration: bool) -> Value {
    let art_styles: Vec<Value> = ART_STYLES
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();

    let mut commands = vec![
        command(
            "text2video",
            "Generate a video from a text prompt",
            vec![
                string_option("prompt", "Describe the video you want to generate", true),
                duration_option(5),
            ],
        ),
        command(
            "img2video",
            "Convert an image to a video",
            vec![
                string_option("image_url", "URL of the image", true),
                string_option("prompt", "Optional motion description", false),
                duration_option(5),
            ],
        ),
        command(
            "faceswap",
            "Swap a face in a video",
            vec![
                string_option("video_url", "URL of the video", true),
                string_option("face_image_url", "URL of the face image to swap in", true),
            ],
        ),
        command(
            "animate",
            "Create an animated video from a prompt",
            vec![
                string_option("prompt", "Describe what you want to animate", true),
                string_option("image_url", "Optional: URL of starting image", false),
                string_option("character", "Optional: name of a stored character", false),
                json!({
                    "type": STRING,
                    "name": "art_style",
                    "description": "Art style (default: Photograph)",
                    "required": false,
                    "choices": art_styles,
                }),
                duration_option(3),
            ],
        ),
        command(
            "lipsync",
            "Sync lips in a video to audio",
            vec![
                string_option("video_url", "URL of the video", true),
                string_option("audio_url", "URL of the audio file", true),
            ],
        ),
        command(
            "talkingphoto",
            "Make a photo talk with audio",
            vec![
                string_option("audio_url", "URL of the audio file", true),
                string_option("image_url", "URL of the image (should contain a face)", false),
                string_option("character", "Name of a stored character", false),
            ],
        ),
        command("magichelp", "Show all available Magic Hour commands", Vec::new()),
    ];

    if narration {
        commands.push(command(
            "narrate",
            "Explain a topic in a short narrated video",
            vec![string_option("topic", "What should the video explain?", true)],
        ));
    }

    Value::Array(commands)
}
