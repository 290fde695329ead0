//! OpenAI-compatible chat completion and speech endpoints.

use async_trait::async_trait;
use reelbot_pipeline::narration::{ContentError, Script, ScriptWriter, SpeechSynthesizer};
use serde::Deserialize;
use serde_json::json;

use crate::http::{ensure_success, HttpError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TTS_MODEL: &str = "tts-1";
pub const DEFAULT_TTS_VOICE: &str = "onyx";

/// Prefix for the footage prompt when the model ignores the JSON format.
const FALLBACK_VISUAL_PREFIX: &str = "Educational video, clear visualization.";

const SYSTEM_PROMPT: &str = "\
You are an expert teacher writing short educational scripts for narrated videos.
Given a topic, write a clear, engaging script that takes at most 30 seconds to speak.
Use simple language and short, natural sentences. Explain the idea step by step, \
give one simple example if it helps, and end with a short takeaway.
No emojis, lists, markdown, camera or sound directions, and never mention \"this video\".
Also write a one-sentence visual prompt describing footage that illustrates the topic.
Reply with a JSON object: {\"narration\": \"...\", \"visual_prompt\": \"...\"}";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connection details shared by the chat and speech adapters.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response, HttpError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        ensure_success(response).await
    }
}

// ---------------------------------------------------------------------------
// Script writer
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScriptReply {
    narration: String,
    visual_prompt: String,
}

pub struct ChatScriptWriter {
    client: OpenAiClient,
    model: String,
}

impl ChatScriptWriter {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ScriptWriter for ChatScriptWriter {
    async fn write_script(&self, topic: &str) -> Result<Script, ContentError> {
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Topic: {topic}") },
            ],
        });

        let completion: ChatCompletion = self
            .client
            .post("/chat/completions", &body)
            .await?
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ContentError::InvalidResponse("completion has no content".into()))?;

        parse_script(&content)
    }
}

/// Structured reply when the model honoured the format, the whole text as
/// narration otherwise.
fn parse_script(content: &str) -> Result<Script, ContentError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ContentError::InvalidResponse("empty script".into()));
    }

    match serde_json::from_str::<ScriptReply>(content) {
        Ok(reply) if !reply.narration.trim().is_empty() => {
            let visual_prompt = if reply.visual_prompt.trim().is_empty() {
                format!("{FALLBACK_VISUAL_PREFIX} {}", reply.narration)
            } else {
                reply.visual_prompt
            };
            Ok(Script {
                narration: reply.narration,
                visual_prompt,
            })
        }
        _ => Ok(Script {
            narration: content.to_string(),
            visual_prompt: format!("{FALLBACK_VISUAL_PREFIX} {content}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

pub struct SpeechClient {
    client: OpenAiClient,
    model: String,
    voice: String,
}

impl SpeechClient {
    pub fn new(client: OpenAiClient, model: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            voice: voice.into(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ContentError> {
        let body = json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": "mp3",
        });

        let bytes = self
            .client
            .post("/audio/speech", &body)
            .await?
            .bytes()
            .await
            .map_err(|e| ContentError::Request(e.to_string()))?;

        if bytes.is_empty() {
            return Err(ContentError::InvalidResponse("speech response was empty".into()));
        }
        Ok(bytes.to_vec())
    }
}
