//! HTTP fetching from Tibia.com.

use reqwest::{redirect, Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{Result, ScrapeError};
use crate::retry::{retry, RetryConfig};
use crate::scraper::encoding::decode_page;

/// Shared HTTP client. Cheap to clone.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryConfig,
}

impl Fetcher {
    pub fn new(upstream: &UpstreamConfig, retry: RetryConfig) -> anyhow::Result<Self> {
        // Redirects are not followed: Tibia.com answers with a 302 while
        // in maintenance, and that has to stay visible.
        let client = Client::builder()
            .user_agent(&upstream.user_agent)
            .timeout(upstream.timeout())
            .redirect(redirect::Policy::none())
            .gzip(true)
            .build()?;

        Ok(Self { client, retry })
    }

    /// Fetch a page and decode it to text.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let bytes = retry(&self.retry, url, || self.fetch_bytes(url)).await?;
        Ok(decode_page(&bytes))
    }

    /// Fetch and deserialize a JSON document.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let bytes = retry(&self.retry, url, || self.fetch_bytes(url)).await?;
        serde_json::from_slice(&bytes).map_err(|e| ScrapeError::Upstream(format!("invalid JSON from {}: {}", url, e)))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Upstream(e.to_string()))?;

        let status = response.status();
        check_status(status)?;

        let body = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::Upstream(e.to_string()))?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(body.to_vec())
    }
}

fn check_status(status: StatusCode) -> Result<()> {
    if status == StatusCode::FOUND {
        return Err(ScrapeError::Maintenance);
    }
    if !status.is_success() {
        return Err(ScrapeError::UpstreamStatus(status.as_u16()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(check_status(StatusCode::FOUND), Err(ScrapeError::Maintenance)));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(ScrapeError::UpstreamStatus(502))
        ));
        let not_found = check_status(StatusCode::NOT_FOUND).unwrap_err();
        assert!(!not_found.is_transient());
    }

    #[test]
    fn test_new_builds_client() {
        let fetcher = Fetcher::new(&UpstreamConfig::default(), RetryConfig::none());
        assert!(fetcher.is_ok());
    }
}
