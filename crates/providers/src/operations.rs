//! Long-running video operations (Veo-style `predictLongRunning`).

use reelbot_pipeline::protocol::OperationProtocol;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "veo-2.0-generate-001";

/// Header carrying the API key, for both the job calls and asset downloads.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

const ASPECT_RATIO: &str = "16:9";
const DURATION_SECONDS: u32 = 8;

/// Creation endpoint for `model`.
pub fn creation_path(model: &str) -> String {
    format!("/models/{model}:predictLongRunning")
}

pub fn protocol(model: &str) -> OperationProtocol {
    OperationProtocol::new(creation_path(model))
}

/// Creation body for a text-to-video operation.
pub fn text_to_video(prompt: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "aspectRatio": ASPECT_RATIO,
            "durationSeconds": DURATION_SECONDS,
            "sampleCount": 1,
            "personGeneration": "dont_allow",
        }
    })
}
