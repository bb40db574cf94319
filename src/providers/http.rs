use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{ArchiveSource, ByteStream, DocumentSource};

/// HTTP client for listing pages and archive downloads
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client; `connect_timeout` bounds connection setup only, the
    /// pipeline bounds whole requests itself
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(connect_timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn get(&self, url: &Url) -> Result<Response, ProviderError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("GET {} failed ({})", url, status);
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(error_text),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::AuthenticationError(error_text)
            }
            _ => ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            },
        })
    }
}

#[async_trait]
impl DocumentSource for HttpClient {
    async fn fetch_html(&self, url: &Url) -> Result<String, ProviderError> {
        debug!("Fetching page {}", url);
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ArchiveSource for HttpClient {
    async fn open_stream(&self, url: &Url) -> Result<ByteStream, ProviderError> {
        debug!("Opening archive stream {}", url);
        let response = self.get(url).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ProviderError::from))
            .boxed())
    }
}
