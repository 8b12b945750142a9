//! Crawl state models.
//!
//! Tracks every URL the discovery phase finds and every request the fetch
//! layer makes, so repeated runs skip what is already done and failures
//! carry their history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a discovered URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    /// Known but not yet fetched.
    Discovered,
    /// Claimed by an in-progress scrape.
    Fetching,
    /// Fetched and processed.
    Fetched,
    /// Exhausted its retries.
    Failed,
    /// Deliberately not fetched (filtered, non-HTML, ...).
    Skipped,
}

impl UrlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "discovered" => Some(Self::Discovered),
            "fetching" => Some(Self::Fetching),
            "fetched" => Some(Self::Fetched),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// How a URL was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Configured start path.
    Seed,
    /// sitemap.xml / robots.txt.
    Sitemap,
    /// Followed from a product-link selector.
    Link,
    /// Followed from a pagination selector.
    Pagination,
}

impl DiscoveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Sitemap => "sitemap",
            Self::Link => "link",
            Self::Pagination => "pagination",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "seed" => Some(Self::Seed),
            "sitemap" => Some(Self::Sitemap),
            "link" => Some(Self::Link),
            "pagination" => Some(Self::Pagination),
            _ => None,
        }
    }
}

/// A URL tracked through discovery and fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlUrl {
    /// Database row ID (0 before insert).
    pub id: i64,
    pub url: String,
    pub source_id: String,
    pub status: UrlStatus,
    pub discovery_method: DiscoveryMethod,
    /// Page that linked here, when followed.
    pub parent_url: Option<String>,
    /// Link depth from the seed pages.
    pub depth: u32,
    pub discovered_at: DateTime<Utc>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// ETag from the last successful fetch, for conditional requests.
    pub etag: Option<String>,
    /// Last-Modified from the last successful fetch.
    pub last_modified: Option<String>,
    /// SHA-256 of the last fetched body.
    pub content_hash: Option<String>,
}

impl CrawlUrl {
    /// Create a freshly discovered URL.
    pub fn new(
        url: String,
        source_id: String,
        discovery_method: DiscoveryMethod,
        parent_url: Option<String>,
        depth: u32,
    ) -> Self {
        Self {
            id: 0,
            url,
            source_id,
            status: UrlStatus::Discovered,
            discovery_method,
            parent_url,
            depth,
            discovered_at: Utc::now(),
            fetched_at: None,
            retry_count: 0,
            last_error: None,
            etag: None,
            last_modified: None,
            content_hash: None,
        }
    }
}

/// One HTTP request made by the fetch layer, for the request log.
#[derive(Debug, Clone)]
pub struct RequestLog {
    pub source_id: String,
    pub url: String,
    pub method: String,
    pub status: Option<u16>,
    pub duration_ms: Option<u64>,
    pub response_size: Option<u64>,
    pub error: Option<String>,
    pub was_conditional: bool,
    pub was_not_modified: bool,
    pub requested_at: DateTime<Utc>,
}
