//! Scraper implementations for marketplace data sources.

pub mod config;
pub mod extract;
pub mod http_client;
pub mod rate_limiter;
pub mod site;

pub use config::{DiscoveryConfig, ExtractConfig, FetchConfig, SiteConfig};
pub use http_client::{FetchedPage, HttpClient};
pub use rate_limiter::{load_rate_limit_state, save_rate_limit_state, RateLimitConfig, RateLimiter};
pub use site::ConfigurableSiteScraper;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::CrawlUrl;

/// Errors from the fetch and extraction layer.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not an HTML page ({content_type})")]
    NotHtml { url: String, content_type: String },
}

/// Raw result of scraping a single product page.
///
/// Nothing here is normalized: the spec pairs are verbatim page text in
/// page order, and the name is whatever the configured selector matched.
#[derive(Debug, Clone)]
pub struct ScrapedProduct {
    /// Source URL of the page.
    pub url: String,
    /// Product name as extracted.
    pub name: String,
    pub description: Option<String>,
    /// Raw key/value spec pairs in page order.
    pub raw_specs: Vec<(String, String)>,
    /// Absolute image URLs in page order.
    pub image_urls: Vec<String>,
    /// Timestamp of retrieval.
    pub fetched_at: DateTime<Utc>,
    /// ETag header from the response.
    pub etag: Option<String>,
    /// Last-Modified header from the response.
    pub last_modified: Option<String>,
    /// True if the server returned 304 Not Modified.
    pub not_modified: bool,
    /// Additional page metadata.
    pub metadata: serde_json::Value,
}

impl ScrapedProduct {
    /// Create a new scrape result.
    pub fn new(url: String, name: String) -> Self {
        Self {
            url,
            name,
            description: None,
            raw_specs: Vec::new(),
            image_urls: Vec::new(),
            fetched_at: Utc::now(),
            etag: None,
            last_modified: None,
            not_modified: false,
            metadata: serde_json::json!({}),
        }
    }

    /// Create a 304 Not Modified result.
    pub fn unmodified(url: String) -> Self {
        let name = title_from_url(&url);
        let mut result = Self::new(url, name);
        result.not_modified = true;
        result
    }
}

/// Derive a product title from a URL's last path segment.
pub fn title_from_url(url: &str) -> String {
    let base = url.split(['?', '#']).next().unwrap_or(url);
    let path = base
        .trim_end_matches('/')
        .split('/')
        .next_back()
        .unwrap_or("untitled");
    let name = path.trim_end_matches(".html").trim_end_matches(".htm");
    let decoded = urlencoding::decode(name)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| name.to_string());
    decoded.replace(['_', '-'], " ").trim().to_string()
}

/// A site the pipeline can discover and scrape products from.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    /// Source this scraper feeds.
    fn source_id(&self) -> &str;

    /// Find product URLs. Does not touch product pages beyond what the
    /// index/pagination crawl requires.
    async fn discover(&self) -> Result<Vec<CrawlUrl>, ScrapeError>;

    /// Fetch and extract one product page. Conditional validators from
    /// the crawl record are used when present.
    async fn scrape_product(&self, url: &CrawlUrl) -> Result<ScrapedProduct, ScrapeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_url() {
        assert_eq!(
            title_from_url("https://example.com/models/50-gsl-3"),
            "50 gsl 3"
        );
        assert_eq!(
            title_from_url("https://example.com/trailers/lowboy_55.html"),
            "lowboy 55"
        );
        assert_eq!(
            title_from_url("https://example.com/models/heavy-haul/?utm=x"),
            "heavy haul"
        );
    }
}
