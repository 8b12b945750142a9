//! Shared CLI helpers.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::repository::{CrawlRepository, Result as RepoResult};
use crate::scrapers::{
    ConfigurableSiteScraper, HttpClient, RateLimitConfig, RateLimiter, SiteConfig,
};

/// Truncate a string for table display.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Standard progress bar for page-by-page work.
pub fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    pb
}

/// Build the rate limiter, HTTP client, and scraper for one site.
pub fn build_scraper(
    source_id: &str,
    site: &SiteConfig,
    settings: &Settings,
) -> RepoResult<(RateLimiter, HttpClient, ConfigurableSiteScraper)> {
    let limiter = RateLimiter::with_config(RateLimitConfig::with_delays(
        site.fetch.min_delay_secs,
        site.fetch.max_jitter_secs,
    ));
    let crawl_log = Arc::new(Mutex::new(CrawlRepository::new(&settings.database_path())?));
    let client = HttpClient::new(
        source_id,
        Duration::from_secs(site.fetch.timeout_secs),
        site.fetch.user_agent.as_deref(),
        limiter.clone(),
    )
    .with_crawl_repo(crawl_log);
    let scraper = ConfigurableSiteScraper::new(source_id, site.clone(), client.clone());
    Ok((limiter, client, scraper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long source name", 10), "a very ...");
    }
}
