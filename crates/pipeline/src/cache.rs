//! Process-wide cache of public URLs for uploaded assets.
//!
//! Entries are never evicted. Concurrent misses for the same key are
//! serialised on that key's upload gate and re-checked under it, so each key
//! is uploaded at most once per process even when several commands race for
//! it. Different keys never wait on each other.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::hosting::{HostChain, HostingError};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read asset '{key}': {source}")]
    Load {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Hosting(#[from] HostingError),
}

/// Maps an asset key (e.g. a character file name) to its public URL.
#[derive(Default)]
pub struct AssetUrlCache {
    urls: RwLock<HashMap<String, String>>,
    upload_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AssetUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.urls.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: impl Into<String>, url: impl Into<String>) {
        self.urls.write().await.insert(key.into(), url.into());
    }

    pub async fn len(&self) -> usize {
        self.urls.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.urls.read().await.is_empty()
    }

    /// Return the cached URL for `key`, or load the bytes with `loader`,
    /// publish them through `hosts` and cache the result.
    ///
    /// Failed uploads are not cached; the next call tries again.
    pub async fn get_or_upload<F, Fut>(
        &self,
        key: &str,
        hosts: &HostChain,
        loader: F,
    ) -> Result<String, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = io::Result<Vec<u8>>>,
    {
        if let Some(url) = self.get(key).await {
            return Ok(url);
        }

        let gate = self.gate(key).await;
        let _guard = gate.lock().await;
        if let Some(url) = self.get(key).await {
            return Ok(url);
        }

        let bytes = loader().await.map_err(|source| CacheError::Load {
            key: key.to_string(),
            source,
        })?;
        let hosted = hosts.publish(key, &bytes).await?;

        tracing::debug!(key, host = %hosted.host, "Cached asset URL");
        self.insert(key, hosted.url.clone()).await;
        Ok(hosted.url)
    }

    async fn gate(&self, key: &str) -> Arc<Mutex<()>> {
        let mut gates = self.upload_gates.lock().await;
        Arc::clone(gates.entry(key.to_string()).or_default())
    }
}
