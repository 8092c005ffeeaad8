// src/fetch.rs

//! Document fetching.
//!
//! Scrapers and the pipeline see only the `DocumentFetcher` trait; the HTTP
//! implementation optionally routes every request through a scraping relay
//! when the source site blocks direct traffic.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result, looks_rate_limited};
use crate::models::{RelayConfig, ScraperConfig};

/// Retrieves raw HTML for a URL.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the document body. Fails with `Fetch` on non-2xx responses and
    /// `RateLimited` when the upstream or relay signals quota exhaustion.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with optional relay routing.
pub struct HttpFetcher {
    client: Client,
    relay: RelayConfig,
}

impl HttpFetcher {
    /// Create a fetcher from scraper and relay configuration.
    pub fn new(scraper: &ScraperConfig, relay: RelayConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&scraper.user_agent)
            .timeout(Duration::from_secs(scraper.timeout_secs))
            .build()?;
        Ok(Self { client, relay })
    }

    /// The URL actually requested: either the document URL itself, or the
    /// relay endpoint with the literal document URL as a query parameter.
    pub fn request_url(&self, url: &str) -> Result<String> {
        if !self.relay.enabled() {
            return Ok(url.to_string());
        }
        let mut relay_url = Url::parse(&self.relay.endpoint)?;
        relay_url
            .query_pairs_mut()
            .append_pair("api_key", &self.relay.api_key)
            .append_pair("url", url);
        Ok(relay_url.to_string())
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let request_url = self.request_url(url)?;
        log::debug!("Fetching {url}");

        let response = self.client.get(&request_url).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(AppError::RateLimited(format!(
                "HTTP 429 fetching {url}"
            )));
        }

        if !status.is_success() {
            // Relay quota errors arrive as non-2xx bodies with a known phrase.
            let body = response.text().await.unwrap_or_default();
            if looks_rate_limited(&body) {
                return Err(AppError::RateLimited(format!(
                    "HTTP {} fetching {url}: {}",
                    status.as_u16(),
                    crate::utils::text::truncate_chars(&body, 200)
                )));
            }
            return Err(AppError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_request_url_is_unchanged() {
        let fetcher =
            HttpFetcher::new(&ScraperConfig::default(), RelayConfig::default()).unwrap();
        assert_eq!(
            fetcher.request_url("https://example.edu/course").unwrap(),
            "https://example.edu/course"
        );
    }

    #[test]
    fn relay_request_embeds_document_url() {
        let relay = RelayConfig {
            endpoint: "https://relay.example.com/".to_string(),
            api_key: "key123".to_string(),
        };
        let fetcher = HttpFetcher::new(&ScraperConfig::default(), relay).unwrap();
        let url = fetcher
            .request_url("https://example.edu/course?code=CSSE1001")
            .unwrap();
        assert!(url.starts_with("https://relay.example.com/?"));
        assert!(url.contains("api_key=key123"));
        assert!(url.contains("url=https%3A%2F%2Fexample.edu%2Fcourse%3Fcode%3DCSSE1001"));
    }
}
