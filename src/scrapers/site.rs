//! Configuration-driven site scraper.
//!
//! One implementation covers every configured site: discovery follows
//! the site's selectors and URL patterns breadth-first (plus the sitemap
//! when enabled), and product extraction applies the site's extract
//! config. No per-site code.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use regex::Regex;
use scraper::Selector;
use tracing::{debug, info, warn};

use super::extract::{extract_links, extract_product, resolve_url};
use super::{HttpClient, ScrapeError, ScrapedProduct, SiteConfig, SiteScraper};
use crate::discovery::SitemapDiscovery;
use crate::models::{CrawlUrl, DiscoveryMethod};

/// Scraper driven entirely by a `SiteConfig`.
pub struct ConfigurableSiteScraper {
    source_id: String,
    config: SiteConfig,
    client: HttpClient,
    url_patterns: Vec<Regex>,
}

impl ConfigurableSiteScraper {
    /// Create a scraper for one configured site.
    pub fn new(source_id: &str, config: SiteConfig, client: HttpClient) -> Self {
        let url_patterns = config
            .discovery
            .url_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Ignoring invalid url_pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect();
        Self {
            source_id: source_id.to_string(),
            config,
            client,
            url_patterns,
        }
    }

    /// Whether a URL counts as a product page. With no patterns
    /// configured, any candidate does.
    fn is_product_url(&self, url: &str) -> bool {
        self.url_patterns.is_empty() || self.url_patterns.iter().any(|re| re.is_match(url))
    }

    /// Same-host check against the configured base URL.
    fn same_domain(&self, url: &str) -> bool {
        let base_host = super::RateLimiter::extract_domain(&self.config.base_url);
        let host = super::RateLimiter::extract_domain(url);
        match (base_host, host) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// URLs seeded from the configured start paths.
    fn seed_urls(&self) -> Vec<String> {
        let paths = if self.config.discovery.start_paths.is_empty() {
            vec!["/".to_string()]
        } else {
            self.config.discovery.start_paths.clone()
        };
        paths
            .iter()
            .filter_map(|p| resolve_url(&self.config.base_url, p))
            .collect()
    }

    /// Mine the sitemap for product URLs.
    async fn discover_from_sitemap(&self, found: &mut Vec<CrawlUrl>, seen: &mut HashSet<String>) {
        let sitemap = SitemapDiscovery::new();
        let urls = match sitemap.discover(&self.config.base_url).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Sitemap discovery failed for {}: {}", self.source_id, e);
                return;
            }
        };
        let before = found.len();
        for url in urls {
            if self.same_domain(&url) && self.is_product_url(&url) && seen.insert(url.clone()) {
                found.push(CrawlUrl::new(
                    url,
                    self.source_id.clone(),
                    DiscoveryMethod::Sitemap,
                    None,
                    0,
                ));
            }
        }
        info!(
            "Sitemap contributed {} product URLs for {}",
            found.len() - before,
            self.source_id
        );
    }

    /// Breadth-first crawl of index pages, collecting product links.
    async fn discover_from_links(&self, found: &mut Vec<CrawlUrl>, seen: &mut HashSet<String>) {
        let discovery = &self.config.discovery;
        let product_sel = discovery
            .product_link_selector
            .as_deref()
            .and_then(|s| Selector::parse(s).ok())
            .or_else(|| {
                // Without a selector, every anchor is a candidate and the
                // URL patterns decide.
                (!self.url_patterns.is_empty()).then(|| Selector::parse("a").unwrap())
            });
        let Some(product_sel) = product_sel else {
            debug!(
                "No product_link_selector or url_patterns for {}; link discovery disabled",
                self.source_id
            );
            return;
        };
        let pagination_sel = discovery
            .pagination_selector
            .as_deref()
            .and_then(|s| Selector::parse(s).ok());

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(String, u32)> = VecDeque::new();
        for url in self.seed_urls() {
            if visited.insert(url.clone()) {
                frontier.push_back((url, 0));
            }
        }

        let mut pages_fetched = 0u32;
        while let Some((index_url, depth)) = frontier.pop_front() {
            if pages_fetched >= discovery.max_pages {
                debug!(
                    "Hit max_pages ({}) for {}, stopping link discovery",
                    discovery.max_pages, self.source_id
                );
                break;
            }
            pages_fetched += 1;

            let page = match self.client.fetch_page(&index_url, None, None).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Failed to fetch index page {}: {}", index_url, e);
                    continue;
                }
            };
            if !page.is_html() {
                continue;
            }
            let Some(body) = page.body else { continue };

            for link in extract_links(&body, &index_url, &product_sel) {
                if !self.same_domain(&link) || !self.is_product_url(&link) {
                    continue;
                }
                if seen.insert(link.clone()) {
                    found.push(CrawlUrl::new(
                        link,
                        self.source_id.clone(),
                        DiscoveryMethod::Link,
                        Some(index_url.clone()),
                        depth,
                    ));
                }
            }

            if let Some(pagination_sel) = &pagination_sel {
                if depth < discovery.max_depth {
                    for link in extract_links(&body, &index_url, pagination_sel) {
                        if self.same_domain(&link) && visited.insert(link.clone()) {
                            frontier.push_back((link, depth + 1));
                        }
                    }
                }
            }
        }
        info!(
            "Link discovery visited {} index pages for {}",
            pages_fetched, self.source_id
        );
    }
}

#[async_trait]
impl SiteScraper for ConfigurableSiteScraper {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn discover(&self) -> Result<Vec<CrawlUrl>, ScrapeError> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();

        if self.config.discovery.use_sitemap {
            self.discover_from_sitemap(&mut found, &mut seen).await;
        }
        self.discover_from_links(&mut found, &mut seen).await;

        Ok(found)
    }

    async fn scrape_product(&self, crawl: &CrawlUrl) -> Result<ScrapedProduct, ScrapeError> {
        let page = self
            .client
            .fetch_page(
                &crawl.url,
                crawl.etag.as_deref(),
                crawl.last_modified.as_deref(),
            )
            .await?;

        if page.not_modified {
            return Ok(ScrapedProduct::unmodified(crawl.url.clone()));
        }
        if !page.is_html() {
            return Err(ScrapeError::NotHtml {
                url: crawl.url.clone(),
                content_type: page.content_type.unwrap_or_default(),
            });
        }
        let body = page.body.unwrap_or_default();

        let extracted = extract_product(&body, &crawl.url, &self.config.extract);
        let name = extracted
            .name
            .unwrap_or_else(|| super::title_from_url(&crawl.url));

        let mut result = ScrapedProduct::new(crawl.url.clone(), name);
        result.description = extracted.description;
        result.raw_specs = extracted.raw_specs;
        result.image_urls = extracted.image_urls;
        result.etag = page.etag;
        result.last_modified = page.last_modified;
        result.metadata = serde_json::json!({
            "final_url": page.final_url,
            "status": page.status,
        });
        Ok(result)
    }
}
