//! Message and embed builders for progress, results and help.

use reelbot_core::status::ColorState;
use reelbot_pipeline::progress::ProgressUpdate;
use serde_json::Value;

use crate::discord::interaction::{Embed, EmbedField, EmbedFooter, EmbedImage};

/// Discord rejects message content longer than this many characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

pub const HELP_COLOR: u32 = 0x9b59b6;

const HELP_ENTRIES: &[(&str, &str)] = &[
    ("`/text2video`", "Generate video from text prompt"),
    ("`/img2video`", "Convert image to video"),
    ("`/faceswap`", "Swap face in a video"),
    ("`/animate`", "Animate a static image"),
    ("`/lipsync`", "Sync video lips to audio"),
    ("`/talkingphoto`", "Make a photo talk with audio"),
    ("`/narrate`", "Explain a topic in a narrated video"),
];

/// Cut `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn progress_embed(update: &ProgressUpdate) -> Embed {
    Embed {
        title: Some(update.title.clone()),
        description: Some(update.description.clone()),
        color: Some(update.color.rgb()),
        ..Embed::default()
    }
}

/// Embed linking to a finished video.
pub fn link_embed(title: &str, description: Option<String>, url: &str, thumbnail: Option<&str>) -> Embed {
    Embed {
        title: Some(title.to_string()),
        description,
        color: Some(ColorState::Success.rgb()),
        fields: vec![EmbedField {
            name: "Video".into(),
            value: format!("[Download Video]({url})"),
            inline: false,
        }],
        thumbnail: thumbnail.map(|url| EmbedImage { url: url.to_string() }),
        timestamp: Some(now()),
        ..Embed::default()
    }
}

/// Embed accompanying an attached video.
pub fn attached_embed(title: &str, description: String) -> Embed {
    Embed {
        title: Some(title.to_string()),
        description: Some(description),
        color: Some(ColorState::Success.rgb()),
        timestamp: Some(now()),
        ..Embed::default()
    }
}

pub fn help_embed() -> Embed {
    Embed {
        title: Some("Magic Hour Video Bot Commands".into()),
        color: Some(HELP_COLOR),
        fields: HELP_ENTRIES
            .iter()
            .map(|(name, value)| EmbedField {
                name: name.to_string(),
                value: value.to_string(),
                inline: false,
            })
            .collect(),
        footer: Some(EmbedFooter {
            text: "Powered by Magic Hour AI".into(),
        }),
        ..Embed::default()
    }
}

/// `"<prefix>: <error>"`, cut to fit a message.
pub fn failure_message(prefix: &str, error: &dyn std::fmt::Display) -> String {
    truncate(&format!("{prefix}: {error}"), MAX_CONTENT_CHARS)
}

/// Reported when a job completed but no asset could be located.
pub fn missing_url_message(done: &str, payload: &Value) -> String {
    truncate(
        &format!("{done} but couldn't get download URL. Response: {payload}"),
        MAX_CONTENT_CHARS,
    )
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("ééééé", 3), "éé…");
        assert_eq!(truncate("🎬🎬🎬", 2).chars().count(), 2);
    }

    #[test]
    fn long_responses_are_cut() {
        let payload = json!({ "blob": "x".repeat(5000) });
        let message = missing_url_message("Video generated", &payload);
        assert_eq!(message.chars().count(), MAX_CONTENT_CHARS);
        assert!(message.starts_with("Video generated but couldn't get download URL. Response: {"));
    }

    #[test]
    fn help_lists_every_command() {
        let embed = help_embed();
        assert_eq!(embed.color, Some(0x9b59b6));
        assert_eq!(embed.fields.len(), 7);
        assert_eq!(embed.footer.unwrap().text, "Powered by Magic Hour AI");
    }

    #[test]
    fn link_embed_has_download_field() {
        let embed = link_embed("Face Swap", None, "https://cdn/v.mp4", None);
        assert_eq!(embed.fields[0].value, "[Download Video](https://cdn/v.mp4)");
        assert_eq!(embed.color, Some(0x00ff00));
    }

    #[test]
    fn progress_embed_uses_state_colour() {
        let embed = progress_embed(&ProgressUpdate {
            title: "Animation in Progress".into(),
            description: "🕐 **Queued** - Waiting in line...".into(),
            color: ColorState::InProgress,
        });
        assert_eq!(embed.color, Some(0xffa500));
    }
}
