//! Downloading produced assets.

use async_trait::async_trait;
use reelbot_pipeline::media::{AssetFetcher, FetchError};

use crate::http::{ensure_success, ApiAuth};

/// Downloads over HTTP(S), refusing anything larger than `max_bytes`.
///
/// URLs under `authed_prefix` (e.g. the operations API, whose file URIs
/// need the API key) get `auth` attached; everything else is fetched
/// anonymously.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
    authed_prefix: Option<(String, ApiAuth)>,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self {
            client,
            max_bytes,
            authed_prefix: None,
        }
    }

    pub fn with_auth_for(mut self, prefix: impl Into<String>, auth: ApiAuth) -> Self {
        self.authed_prefix = Some((prefix.into(), auth));
        self
    }

    fn auth_for(&self, url: &str) -> Option<&ApiAuth> {
        self.authed_prefix
            .as_ref()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, auth)| auth)
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(url);
        if let Some(auth) = self.auth_for(url) {
            request = auth.apply(request);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        let mut response = ensure_success(response).await?;

        if let Some(size) = response.content_length() {
            check_size(size, self.max_bytes)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?
        {
            check_size((bytes.len() + chunk.len()) as u64, self.max_bytes)?;
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(url, size = bytes.len(), "Asset downloaded");
        Ok(bytes)
    }
}

/// Bodies without a `Content-Length` are checked as they stream in.
fn check_size(size: u64, limit: u64) -> Result<(), FetchError> {
    if size > limit {
        return Err(FetchError::TooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_size(1024, 1024).is_ok());
        assert_matches!(
            check_size(1025, 1024),
            Err(FetchError::TooLarge { size: 1025, limit: 1024 })
        );
    }

    /// Serves one chunked response (no `Content-Length`) of `chunks` chunks
    /// of `chunk_size` bytes and returns its URL.
    async fn chunked_server(chunks: usize, chunk_size: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let mut response =
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
            for _ in 0..chunks {
                response.extend_from_slice(format!("{chunk_size:x}\r\n").as_bytes());
                response.extend(std::iter::repeat(b'v').take(chunk_size));
                response.extend_from_slice(b"\r\n");
            }
            response.extend_from_slice(b"0\r\n\r\n");
            let _ = socket.write_all(&response).await;
        });
        format!("http://{addr}/video.mp4")
    }

    fn local_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn unsized_body_over_limit_is_rejected() {
        let url = chunked_server(2, 600).await;
        let fetcher = HttpFetcher::new(local_client(), 1000);

        assert_matches!(
            fetcher.fetch(&url).await,
            Err(FetchError::TooLarge { limit: 1000, .. })
        );
    }

    #[tokio::test]
    async fn unsized_body_within_limit_is_returned() {
        let url = chunked_server(2, 300).await;
        let fetcher = HttpFetcher::new(local_client(), 1000);

        assert_eq!(fetcher.fetch(&url).await.unwrap().len(), 600);
    }

    #[test]
    fn auth_only_applies_under_prefix() {
        let fetcher = HttpFetcher::new(reqwest::Client::new(), 1024).with_auth_for(
            "https://generativelanguage.googleapis.com/",
            ApiAuth::Header {
                name: "x-goog-api-key",
                value: "k".into(),
            },
        );
        assert!(fetcher
            .auth_for("https://generativelanguage.googleapis.com/v1beta/files/abc:download")
            .is_some());
        assert!(fetcher.auth_for("https://cdn.magichour.ai/v.mp4").is_none());
    }
}
