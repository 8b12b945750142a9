//! Site scraper configuration types.
//!
//! Everything site-specific lives here as declarative selectors and
//! patterns in the config file, not as per-site code: which pages to
//! start from, how product links are recognized, and where on a product
//! page the name, spec pairs, and images sit.

use serde::{Deserialize, Serialize};

use crate::models::SourceKind;

/// Per-site configuration from `[sites.<id>]` in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Human-readable site name (falls back to the source id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Manufacturer catalog or dealer inventory.
    #[serde(default = "default_kind")]
    pub kind: SourceKind,
    pub base_url: String,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl SiteConfig {
    /// Effective name, using the source id if not set.
    pub fn name_or(&self, default: &str) -> String {
        self.name.clone().unwrap_or_else(|| default.to_string())
    }
}

fn default_kind() -> SourceKind {
    SourceKind::Manufacturer
}

/// How product URLs are found on a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Paths to seed the crawl with, e.g. `["/trailers", "/models"]`.
    #[serde(default)]
    pub start_paths: Vec<String>,
    /// CSS selector matching anchors that lead to product pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_link_selector: Option<String>,
    /// CSS selector matching anchors that lead to further index pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_selector: Option<String>,
    /// Regex patterns a URL must match to count as a product page.
    /// Empty means every product-link anchor counts.
    #[serde(default)]
    pub url_patterns: Vec<String>,
    /// Also mine sitemap.xml / robots.txt for product URLs.
    #[serde(default)]
    pub use_sitemap: bool,
    /// Cap on index pages fetched during one discovery run.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Cap on link depth from the seed pages.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            start_paths: Vec::new(),
            product_link_selector: None,
            pagination_selector: None,
            url_patterns: Vec::new(),
            use_sitemap: false,
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_pages() -> u32 {
    50
}

fn default_max_depth() -> u32 {
    4
}

/// Where on a product page the fields sit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Selector for the product name. Falls back to og:title, then h1,
    /// then the URL's last path segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_selector: Option<String>,
    /// Selector for the description block. Falls back to the
    /// meta description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_selector: Option<String>,
    /// Selector for spec tables. Defaults to every `table` on the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_table_selector: Option<String>,
    /// Selector for colon-separated spec list items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_list_selector: Option<String>,
    /// Selector for product images. Defaults to every `img`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_selector: Option<String>,
    /// Attribute holding the image URL (lazy-loading sites use
    /// `data-src`).
    #[serde(default = "default_image_attr")]
    pub image_attr: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            name_selector: None,
            description_selector: None,
            spec_table_selector: None,
            spec_list_selector: None,
            image_selector: None,
            image_attr: default_image_attr(),
        }
    }
}

fn default_image_attr() -> String {
    "src".to_string()
}

/// Fetch pacing and client settings for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Minimum delay between requests to the site, in seconds.
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: f64,
    /// Random extra delay added on top of the minimum, in seconds.
    #[serde(default = "default_max_jitter")]
    pub max_jitter_secs: f64,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Custom user agent for this site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay(),
            max_jitter_secs: default_max_jitter(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_min_delay() -> f64 {
    2.0
}

fn default_max_jitter() -> f64 {
    1.5
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let cfg: SiteConfig = toml::from_str(
            r#"
            base_url = "https://example.com"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.kind, SourceKind::Manufacturer);
        assert_eq!(cfg.fetch.min_delay_secs, 2.0);
        assert_eq!(cfg.fetch.max_jitter_secs, 1.5);
        assert_eq!(cfg.discovery.max_pages, 50);
        assert_eq!(cfg.extract.image_attr, "src");
    }

    #[test]
    fn test_full_config_parses() {
        let cfg: SiteConfig = toml::from_str(
            r#"
            name = "Talon Trailers"
            kind = "manufacturer"
            base_url = "https://talontrailers.example"

            [discovery]
            start_paths = ["/models"]
            product_link_selector = ".model-card a"
            pagination_selector = "a.next"
            url_patterns = ["/models/[a-z0-9-]+$"]
            use_sitemap = true

            [extract]
            name_selector = "h1.model-name"
            spec_table_selector = "table.specs"
            image_attr = "data-src"

            [fetch]
            min_delay_secs = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.name_or("talon"), "Talon Trailers");
        assert!(cfg.discovery.use_sitemap);
        assert_eq!(cfg.fetch.min_delay_secs, 3.0);
        assert_eq!(cfg.extract.image_attr, "data-src");
    }
}
