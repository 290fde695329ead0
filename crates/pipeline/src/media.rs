//! Turning a located [`Asset`] into bytes on hand.

use async_trait::async_trait;
use reelbot_core::asset::Asset;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Request(String),

    #[error("download returned HTTP {0}")]
    HttpStatus(u16),

    #[error("asset is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

/// Downloads an asset by URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Bytes of `asset`, downloading only when it is a URL.
pub async fn materialize(asset: Asset, fetcher: &dyn AssetFetcher) -> Result<Vec<u8>, FetchError> {
    match asset {
        Asset::Inline { bytes, .. } => Ok(bytes),
        Asset::Url(url) => fetcher.fetch(&url).await,
    }
}
