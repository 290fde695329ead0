//! Named character images stored on disk and published on first use.
//!
//! A character is an image file `<name>.<ext>` in the characters directory.
//! Remote services need a public URL, so the first command that uses a
//! character uploads it through the host chain; the URL is then reused for
//! the life of the process.

use std::path::{Path, PathBuf};

use reelbot_pipeline::cache::{AssetUrlCache, CacheError};
use reelbot_pipeline::hosting::HostChain;

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("Invalid character name '{0}'")]
    InvalidName(String),

    #[error("Character '{0}' not found")]
    NotFound(String),

    #[error("Could not publish character: {0}")]
    Publish(#[from] CacheError),
}

pub struct CharacterLibrary {
    dir: PathBuf,
    cache: AssetUrlCache,
    hosts: HostChain,
}

impl CharacterLibrary {
    pub fn new(dir: impl Into<PathBuf>, hosts: HostChain) -> Self {
        Self {
            dir: dir.into(),
            cache: AssetUrlCache::new(),
            hosts,
        }
    }

    pub fn cache(&self) -> &AssetUrlCache {
        &self.cache
    }

    /// Public URL for the character called `name`, uploading it once.
    pub async fn resolve(&self, name: &str) -> Result<String, CharacterError> {
        let name = normalize(name)?;
        let path = self
            .locate(&name)
            .await
            .ok_or_else(|| CharacterError::NotFound(name.clone()))?;
        let key = file_key(&path, &name);

        let url = self
            .cache
            .get_or_upload(&key, &self.hosts, || tokio::fs::read(path))
            .await?;
        tracing::debug!(character = %name, url = %url, "Character resolved");
        Ok(url)
    }

    async fn locate(&self, name: &str) -> Option<PathBuf> {
        for ext in EXTENSIONS {
            let candidate = self.dir.join(format!("{name}.{ext}"));
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Lowercased name restricted to `[a-z0-9_-]`, so it cannot leave the
/// characters directory.
fn normalize(name: &str) -> Result<String, CharacterError> {
    let name = name.trim().to_ascii_lowercase();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(name)
    } else {
        Err(CharacterError::InvalidName(name))
    }
}

fn file_key(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}
