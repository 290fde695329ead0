//! Audio/video muxing through an external `ffmpeg` binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reelbot_pipeline::narration::{ContentError, MediaCombiner};

pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Error type for ffmpeg invocations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<FfmpegError> for ContentError {
    fn from(e: FfmpegError) -> Self {
        ContentError::Process(e.to_string())
    }
}

/// Loops the footage under the narration and stops with the audio.
#[derive(Debug, Clone)]
pub struct FfmpegCombiner {
    binary: PathBuf,
}

impl FfmpegCombiner {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn mux(&self, video: &[u8], audio: &[u8]) -> Result<Vec<u8>, FfmpegError> {
        let scratch = tempfile::tempdir()?;
        let video_path = scratch.path().join("footage.mp4");
        let audio_path = scratch.path().join("narration.mp3");
        let output_path = scratch.path().join("narrated.mp4");

        tokio::fs::write(&video_path, video).await?;
        tokio::fs::write(&audio_path, audio).await?;

        let output = tokio::process::Command::new(&self.binary)
            .args(mux_args(&video_path, &audio_path, &output_path))
            .output()
            .await
            .map_err(FfmpegError::NotFound)?;

        if !output.status.success() {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(tokio::fs::read(&output_path).await?)
    }
}

impl Default for FfmpegCombiner {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG)
    }
}

#[async_trait]
impl MediaCombiner for FfmpegCombiner {
    async fn combine(&self, video: &[u8], audio: &[u8]) -> Result<Vec<u8>, ContentError> {
        Ok(self.mux(video, audio).await?)
    }
}

fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    let path = |p: &Path| p.to_string_lossy().to_string();
    let mut args: Vec<String> = ["-y", "-stream_loop", "-1", "-i"]
        .into_iter()
        .map(String::from)
        .collect();
    args.push(path(video));
    args.extend(["-i".to_string(), path(audio)]);
    args.extend(
        [
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "libx264", "-c:a", "aac", "-shortest",
            "-movflags", "+faststart",
        ]
        .into_iter()
        .map(String::from),
    );
    args.push(path(output));
    args
}
