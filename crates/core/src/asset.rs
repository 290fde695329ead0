//! Locating the produced asset inside a completed job's payload.
//!
//! Vendors are inconsistent about which field carries the output, so the
//! lookup follows a fixed precedence:
//!
//! 1. `downloads[0].url`
//! 2. `video_url`
//! 3. `output.url`
//! 4. inline base64 bytes (`bytesBase64Encoded`, top level or `videos[0]`)
//! 5. a nested operation URI (`videos[0].uri`, `videos[0].gcsUri`,
//!    `generateVideoResponse.generatedSamples[0].video.uri`)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

/// JSON pointers probed for inline bytes, in order.
const INLINE_CONTAINERS: &[&str] = &["", "/videos/0"];

/// JSON pointers probed for an operation output URI, in order.
const NESTED_URI_POINTERS: &[&str] = &[
    "/videos/0/uri",
    "/videos/0/gcsUri",
    "/generateVideoResponse/generatedSamples/0/video/uri",
];

/// The produced media, either fetchable or already in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Url(String),
    Inline {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl Asset {
    pub fn url(&self) -> Option<&str> {
        match self {
            Asset::Url(url) => Some(url),
            Asset::Inline { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("no download URL in response")]
    Missing,

    #[error("inline asset is not valid base64: {0}")]
    InvalidInline(String),
}

/// Find the produced asset in `payload` following the module precedence.
pub fn locate_asset(payload: &Value) -> Result<Asset, AssetError> {
    if let Some(url) = find_url(payload) {
        return Ok(Asset::Url(url.to_string()));
    }

    for pointer in INLINE_CONTAINERS {
        let Some(container) = payload.pointer(pointer) else {
            continue;
        };
        if let Some(encoded) = non_empty_str(container.get("bytesBase64Encoded")) {
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| AssetError::InvalidInline(e.to_string()))?;
            let mime_type = non_empty_str(container.get("mimeType")).map(str::to_string);
            return Ok(Asset::Inline { bytes, mime_type });
        }
    }

    NESTED_URI_POINTERS
        .iter()
        .find_map(|pointer| non_empty_str(payload.pointer(pointer)))
        .map(|url| Asset::Url(url.to_string()))
        .ok_or(AssetError::Missing)
}

/// The first of `downloads[0].url`, `video_url`, `output.url`.
pub fn find_url(payload: &Value) -> Option<&str> {
    let download = payload
        .get("downloads")
        .and_then(Value::as_array)
        .and_then(|downloads| downloads.first())
        .and_then(|first| non_empty_str(first.get("url")));

    download
        .or_else(|| non_empty_str(payload.get("video_url")))
        .or_else(|| non_empty_str(payload.pointer("/output/url")))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
