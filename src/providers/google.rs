use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::SearchProvider;
use crate::retrieval::model::SearchHit;

/// Google Custom Search client
#[derive(Debug)]
pub struct GoogleSearch {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Search engine identifier (`cx`)
    client_id: String,
    /// API endpoint URL
    endpoint: String,
}

/// Custom Search response; `items` is omitted when nothing matched
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// Individual result in a Custom Search response
#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub link: String,
}

impl From<SearchItem> for SearchHit {
    fn from(item: SearchItem) -> Self {
        SearchHit::new(item.title, item.link)
    }
}

impl GoogleSearch {
    /// Create a new Custom Search client
    pub fn new(
        api_key: impl Into<String>,
        client_id: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            client_id: client_id.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Parse a raw Custom Search response body
    pub fn parse_response(body: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let response: SearchResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(response.items.into_iter().map(SearchHit::from).collect())
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        debug!("Searching for '{}'", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.client_id.as_str()),
                ("q", query),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Search API error ({}): {}", status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::AuthenticationError(error_text)
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(error_text),
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let body = response.text().await?;
        Self::parse_response(&body)
    }
}
