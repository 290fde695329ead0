use std::path::PathBuf;
use std::time::Duration;

use reelbot_core::job::DEFAULT_POLL_INTERVAL_SECS;
use reelbot_providers::{ffmpeg, magichour, openai, operations};

/// Discord's attachment ceiling for bots without boosts.
pub const DEFAULT_UPLOAD_LIMIT_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Bot configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `10`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight commands (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub discord: DiscordConfig,
    pub magic_hour_api_key: String,
    pub magic_hour_base_url: String,
    pub poll_interval: Duration,
    /// Largest result the bot attaches instead of linking.
    pub upload_limit_bytes: u64,
    /// Overwrite the global slash commands at start-up (default: `true`).
    pub register_commands: bool,
    pub characters_dir: PathBuf,
    /// Present only when both the LLM and the operations keys are set.
    pub narration: Option<NarrationConfig>,
}

#[derive(Clone)]
pub struct DiscordConfig {
    pub application_id: String,
    /// Hex-encoded Ed25519 key from the developer portal.
    pub public_key: String,
    pub bot_token: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("application_id", &self.application_id)
            .field("public_key", &self.public_key)
            .field("bot_token", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct NarrationConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub operations_api_key: String,
    pub operations_base_url: String,
    pub operations_model: String,
    pub ffmpeg_path: PathBuf,
}

impl std::fmt::Debug for NarrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationConfig")
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("tts_model", &self.tts_model)
            .field("tts_voice", &self.tts_voice)
            .field("operations_base_url", &self.operations_base_url)
            .field("operations_model", &self.operations_model)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                  | Default                         |
    /// |--------------------------|---------------------------------|
    /// | `DISCORD_APPLICATION_ID` | required                        |
    /// | `DISCORD_PUBLIC_KEY`     | required                        |
    /// | `DISCORD_BOT_TOKEN`      | required                        |
    /// | `MAGIC_HOUR_API_KEY`     | required                        |
    /// | `HOST`                   | `0.0.0.0`                       |
    /// | `PORT`                   | `3000`                          |
    /// | `REQUEST_TIMEOUT_SECS`   | `10`                            |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                            |
    /// | `MAGIC_HOUR_BASE_URL`    | `https://api.magichour.ai/v1`   |
    /// | `POLL_INTERVAL_SECS`     | `5`                             |
    /// | `UPLOAD_LIMIT_BYTES`     | `26214400`                      |
    /// | `REGISTER_COMMANDS`      | `true`                          |
    /// | `CHARACTERS_DIR`         | `characters`                    |
    ///
    /// Narration is enabled when `OPENAI_API_KEY` and `OPERATIONS_API_KEY`
    /// are both set; `OPENAI_BASE_URL`, `OPENAI_MODEL`, `TTS_MODEL`,
    /// `TTS_VOICE`, `OPERATIONS_BASE_URL`, `OPERATIONS_MODEL` and
    /// `FFMPEG_PATH` tune it.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BotConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let discord = DiscordConfig {
            application_id: required("DISCORD_APPLICATION_ID")?,
            public_key: required("DISCORD_PUBLIC_KEY")?,
            bot_token: required("DISCORD_BOT_TOKEN")?,
        };

        let poll_interval_secs: u64 = parse(&var, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_SECS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let narration = match (var("OPENAI_API_KEY"), var("OPERATIONS_API_KEY")) {
            (Some(openai_api_key), Some(operations_api_key)) => Some(NarrationConfig {
                openai_api_key,
                openai_base_url: or("OPENAI_BASE_URL", openai::DEFAULT_BASE_URL),
                openai_model: or("OPENAI_MODEL", openai::DEFAULT_CHAT_MODEL),
                tts_model: or("TTS_MODEL", openai::DEFAULT_TTS_MODEL),
                tts_voice: or("TTS_VOICE", openai::DEFAULT_TTS_VOICE),
                operations_api_key,
                operations_base_url: or("OPERATIONS_BASE_URL", operations::DEFAULT_BASE_URL),
                operations_model: or("OPERATIONS_MODEL", operations::DEFAULT_MODEL),
                ffmpeg_path: PathBuf::from(or("FFMPEG_PATH", ffmpeg::DEFAULT_FFMPEG)),
            }),
            _ => None,
        };

        Ok(Self {
            host: or("HOST", "0.0.0.0"),
            port: parse(&var, "PORT", 3000)?,
            request_timeout_secs: parse(&var, "REQUEST_TIMEOUT_SECS", 10)?,
            shutdown_timeout_secs: parse(&var, "SHUTDOWN_TIMEOUT_SECS", 30)?,
            discord,
            magic_hour_api_key: required("MAGIC_HOUR_API_KEY")?,
            magic_hour_base_url: or("MAGIC_HOUR_BASE_URL", magichour::DEFAULT_BASE_URL),
            poll_interval: Duration::from_secs(poll_interval_secs),
            upload_limit_bytes: parse(&var, "UPLOAD_LIMIT_BYTES", DEFAULT_UPLOAD_LIMIT_BYTES)?,
            register_commands: parse(&var, "REGISTER_COMMANDS", true)?,
            characters_dir: PathBuf::from(or("CHARACTERS_DIR", "characters")),
            narration,
        })
    }
}

fn parse<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key,
            reason: e.to_string(),
            value,
        }),
    }
}
