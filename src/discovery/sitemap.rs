//! Sitemap and robots.txt discovery.
//!
//! Parses robots.txt `Sitemap:` directives and conventional sitemap
//! locations to enumerate page URLs without crawling index pages.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

/// Standard sitemap locations to check.
const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap/sitemap.xml",
    "/wp-sitemap.xml",
];

/// Sitemap indexes processed per site before giving up.
const MAX_SITEMAPS: usize = 50;

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Discovers URLs from sitemaps and robots.txt.
pub struct SitemapDiscovery {
    client: reqwest::Client,
}

impl Default for SitemapDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl SitemapDiscovery {
    /// Create a new sitemap discovery source.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(crate::scrapers::http_client::USER_AGENT)
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Enumerate all URLs reachable from the site's sitemaps.
    pub async fn discover(&self, base_url: &str) -> Result<Vec<String>, SitemapError> {
        let base = base_url.trim_end_matches('/');

        let mut pending: Vec<String> = self.robots_sitemaps(base).await;
        for path in SITEMAP_PATHS {
            pending.push(format!("{}{}", base, path));
        }

        let mut processed: HashSet<String> = HashSet::new();
        let mut urls = Vec::new();

        while let Some(sitemap_url) = pending.pop() {
            if processed.contains(&sitemap_url) || processed.len() >= MAX_SITEMAPS {
                continue;
            }
            processed.insert(sitemap_url.clone());

            debug!("Fetching sitemap: {}", sitemap_url);
            let response = match self.client.get(&sitemap_url).send().await {
                Ok(r) if r.status().is_success() => r,
                Ok(r) => {
                    debug!("Sitemap {} returned {}", sitemap_url, r.status());
                    continue;
                }
                Err(e) => {
                    debug!("Failed to fetch sitemap {}: {}", sitemap_url, e);
                    continue;
                }
            };
            let text = match response.text().await {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to read sitemap {}: {}", sitemap_url, e);
                    continue;
                }
            };

            if text.contains("<sitemapindex") {
                for loc in extract_locs(&text) {
                    if !processed.contains(&loc) {
                        pending.push(loc);
                    }
                }
            } else {
                urls.extend(extract_locs(&text));
            }
        }

        debug!("Sitemap discovery found {} URLs", urls.len());
        Ok(urls)
    }

    /// Parse robots.txt for Sitemap: directives.
    async fn robots_sitemaps(&self, base: &str) -> Vec<String> {
        let robots_url = format!("{}/robots.txt", base);
        let response = match self.client.get(&robots_url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("robots.txt returned {}", r.status());
                return vec![];
            }
            Err(e) => {
                debug!("Failed to fetch robots.txt: {}", e);
                return vec![];
            }
        };
        let text = match response.text().await {
            Ok(t) => t,
            Err(_) => return vec![],
        };

        text.lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.to_lowercase().starts_with("sitemap:") {
                    Some(line[8..].trim().to_string())
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Extract `<loc>` values from sitemap XML.
///
/// Sitemaps use XML namespaces that HTML parsers handle poorly, so
/// simple string scanning is the robust option here.
fn extract_locs(xml: &str) -> Vec<String> {
    let mut locs = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<loc>") {
        rest = &rest[start + 5..];
        if let Some(end) = rest.find("</loc>") {
            let url = rest[..end].trim();
            locs.push(unescape_xml(url));
            rest = &rest[end + 6..];
        } else {
            break;
        }
    }
    locs
}

/// Unescape the XML entities allowed in sitemap URLs.
fn unescape_xml(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_locs() {
        let xml = r#"<?xml version="1.0"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://example.com/models/a</loc></url>
                <url>
                    <loc>https://example.com/models/b?x=1&amp;y=2</loc>
                </url>
            </urlset>"#;
        assert_eq!(
            extract_locs(xml),
            vec![
                "https://example.com/models/a".to_string(),
                "https://example.com/models/b?x=1&y=2".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_locs_handles_single_line() {
        let xml = "<urlset><url><loc>https://a.example/1</loc></url><url><loc>https://a.example/2</loc></url></urlset>";
        assert_eq!(extract_locs(xml).len(), 2);
    }
}
