//! HTTP client with conditional requests, retries, and request logging.
//!
//! All crawl traffic goes through here: the rate limiter paces each
//! request, validators from previous fetches ride along as conditional
//! headers, transient failures retry a bounded number of times with the
//! limiter's backoff between attempts, and every attempt lands in the
//! crawl request log.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::header;
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;
use super::ScrapeError;
use crate::models::RequestLog;
use crate::repository::CrawlRepository;

/// Default user agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; AxlesBot/0.4; +https://axles.example/bot)";

/// Attempts per URL before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Result of fetching one page.
#[derive(Debug)]
pub struct FetchedPage {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    /// Response body (None on 304 Not Modified).
    pub body: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
    pub not_modified: bool,
}

impl FetchedPage {
    /// Whether the content type is HTML (or unstated, which sites
    /// serving HTML without headers make common enough to allow).
    pub fn is_html(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(ct) => ct.contains("text/html") || ct.contains("application/xhtml"),
        }
    }
}

/// HTTP client bound to one source.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    source_id: String,
    rate_limiter: RateLimiter,
    crawl_repo: Option<Arc<Mutex<CrawlRepository>>>,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(
        source_id: &str,
        timeout: Duration,
        user_agent: Option<&str>,
        rate_limiter: RateLimiter,
    ) -> Self {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(USER_AGENT))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            source_id: source_id.to_string(),
            rate_limiter,
            crawl_repo: None,
        }
    }

    /// Set the crawl repository for request logging.
    pub fn with_crawl_repo(mut self, repo: Arc<Mutex<CrawlRepository>>) -> Self {
        self.crawl_repo = Some(repo);
        self
    }

    async fn log_request(&self, log: RequestLog) {
        if let Some(repo) = &self.crawl_repo {
            let repo = repo.lock().await;
            if let Err(e) = repo.record_request(&log) {
                warn!("Failed to record request log: {}", e);
            }
        }
    }

    /// Fetch a page as text, with conditional headers when validators
    /// are known. Retries transient failures and throttling responses.
    pub async fn fetch_page(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchedPage, ScrapeError> {
        let was_conditional = etag.is_some() || last_modified.is_some();
        let mut last_error: Option<ScrapeError> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let domain = self.rate_limiter.acquire(url).await;
            let started = Instant::now();
            let requested_at = Utc::now();

            let mut request = self.client.get(url);
            if let Some(etag) = etag {
                request = request.header(header::IF_NONE_MATCH, etag);
            }
            if let Some(lm) = last_modified {
                request = request.header(header::IF_MODIFIED_SINCE, lm);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    self.log_request(RequestLog {
                        source_id: self.source_id.clone(),
                        url: url.to_string(),
                        method: "GET".to_string(),
                        status: None,
                        duration_ms: Some(started.elapsed().as_millis() as u64),
                        response_size: None,
                        error: Some(e.to_string()),
                        was_conditional,
                        was_not_modified: false,
                        requested_at,
                    })
                    .await;
                    warn!("Attempt {}/{} for {} failed: {}", attempt, MAX_ATTEMPTS, url, e);
                    last_error = Some(ScrapeError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            // Throttling or transient server failure: back off and retry.
            if matches!(
                status,
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            ) || status.is_server_error()
            {
                if let Some(domain) = &domain {
                    self.rate_limiter.report_throttled(domain).await;
                }
                self.log_request(RequestLog {
                    source_id: self.source_id.clone(),
                    url: url.to_string(),
                    method: "GET".to_string(),
                    status: Some(status.as_u16()),
                    duration_ms: Some(started.elapsed().as_millis() as u64),
                    response_size: None,
                    error: Some(format!("status {}", status)),
                    was_conditional,
                    was_not_modified: false,
                    requested_at,
                })
                .await;
                warn!(
                    "Attempt {}/{} for {} got {}, backing off",
                    attempt, MAX_ATTEMPTS, url, status
                );
                last_error = Some(ScrapeError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
                continue;
            }

            let not_modified = status == StatusCode::NOT_MODIFIED;
            if !not_modified && !status.is_success() {
                self.log_request(RequestLog {
                    source_id: self.source_id.clone(),
                    url: url.to_string(),
                    method: "GET".to_string(),
                    status: Some(status.as_u16()),
                    duration_ms: Some(started.elapsed().as_millis() as u64),
                    response_size: None,
                    error: Some(format!("status {}", status)),
                    was_conditional,
                    was_not_modified: false,
                    requested_at,
                })
                .await;
                if let Some(domain) = &domain {
                    self.rate_limiter.report_success(domain).await;
                }
                // 404s and friends are permanent; retrying won't help.
                return Err(ScrapeError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let header_str = |name: header::HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string())
            };
            let response_etag = header_str(header::ETAG);
            let response_last_modified = header_str(header::LAST_MODIFIED);
            let content_type = header_str(header::CONTENT_TYPE);
            let final_url = response.url().to_string();

            let body = if not_modified {
                None
            } else {
                match response.text().await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!("Failed to read body of {}: {}", url, e);
                        last_error = Some(ScrapeError::Http(e));
                        continue;
                    }
                }
            };

            if let Some(domain) = &domain {
                self.rate_limiter.report_success(domain).await;
            }
            self.log_request(RequestLog {
                source_id: self.source_id.clone(),
                url: url.to_string(),
                method: "GET".to_string(),
                status: Some(status.as_u16()),
                duration_ms: Some(started.elapsed().as_millis() as u64),
                response_size: body.as_ref().map(|b| b.len() as u64),
                error: None,
                was_conditional,
                was_not_modified: not_modified,
                requested_at,
            })
            .await;
            debug!("Fetched {} ({})", url, status);

            return Ok(FetchedPage {
                final_url,
                status: status.as_u16(),
                body,
                etag: response_etag,
                last_modified: response_last_modified,
                content_type,
                not_modified,
            });
        }

        Err(last_error.unwrap_or(ScrapeError::Status {
            url: url.to_string(),
            status: 0,
        }))
    }

    /// Fetch a binary resource (images). Rate limited but never
    /// conditional and never logged as crawl traffic.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let domain = self.rate_limiter.acquire(url).await;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            if let Some(domain) = &domain {
                if matches!(
                    status,
                    StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
                ) || status.is_server_error()
                {
                    self.rate_limiter.report_throttled(domain).await;
                }
            }
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if let Some(domain) = &domain {
            self.rate_limiter.report_success(domain).await;
        }
        Ok(response.bytes().await?.to_vec())
    }
}
