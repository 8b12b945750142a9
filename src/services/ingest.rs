//! The scrape-normalize-upsert pipeline.
//!
//! Runs one source end to end: discover product URLs, fetch each one
//! sequentially through the rate-limited client, normalize and
//! reconcile the extraction, and upsert the result. Per-item failures
//! are logged, counted, and skipped; one broken page never stops a run.

use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::models::{Condition, Listing, ListingStatus, ProductImage};
use crate::normalize::{
    normalize, parse_price_cents, parse_year, reconcile, NormalizedProduct,
};
use crate::repository::{
    CrawlRepository, ListingRepository, ProductRepository, SourceRepository, UpsertOutcome,
};
use crate::scrapers::{ScrapeError, SiteScraper};

/// Options for one ingest run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Cap on product pages fetched this run.
    pub limit: Option<u32>,
    /// Re-check already-fetched URLs with conditional requests.
    pub refresh: bool,
    /// Normalize without writing anything.
    pub dry_run: bool,
}

/// Counters from one ingest run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// New URLs discovered this run.
    pub discovered: u64,
    /// Product pages fetched with a body.
    pub fetched: u64,
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Where dealer pages additionally land as listings.
struct ListingSink<'a> {
    repo: &'a ListingRepository,
    profile_id: String,
}

/// Orchestrates one source's pipeline.
pub struct IngestService<'a> {
    source_id: &'a str,
    scraper: &'a dyn SiteScraper,
    products: &'a ProductRepository,
    crawl: &'a CrawlRepository,
    sources: &'a SourceRepository,
    listings: Option<ListingSink<'a>>,
}

impl<'a> IngestService<'a> {
    pub fn new(
        source_id: &'a str,
        scraper: &'a dyn SiteScraper,
        products: &'a ProductRepository,
        crawl: &'a CrawlRepository,
        sources: &'a SourceRepository,
    ) -> Self {
        Self {
            source_id,
            scraper,
            products,
            crawl,
            sources,
            listings: None,
        }
    }

    /// For dealer sources: also upsert each scraped unit as an active
    /// listing owned by `profile_id`.
    pub fn with_listing_sink(mut self, repo: &'a ListingRepository, profile_id: String) -> Self {
        self.listings = Some(ListingSink { repo, profile_id });
        self
    }

    /// Build a marketplace listing from a dealer page.
    ///
    /// Dealer inventory pages carry the price and year in the title or
    /// quick-spec list rather than a spec table, so both are mined from
    /// the raw pairs with the name as fallback.
    fn dealer_listing(&self, normalized: &NormalizedProduct, profile_id: &str) -> Listing {
        let product = &normalized.product;
        let mut listing = Listing::new(profile_id.to_string(), product.name.clone());
        listing.description = product.description.clone();
        listing.category = product.category.clone();
        listing.model = product
            .model_number
            .clone()
            .or_else(|| product.series.clone());
        listing.source_url = Some(product.source_url.clone());
        listing.status = ListingStatus::Active;

        let price_text = normalized
            .specs
            .iter()
            .find(|s| s.key.to_lowercase().contains("price") || s.value.contains('$'))
            .map(|s| s.value.as_str());
        listing.price_cents = price_text
            .and_then(parse_price_cents)
            .or_else(|| parse_price_cents(&product.name));
        listing.year = parse_year(&product.name);

        let haystack = format!("{} {}", product.name, listing.description.as_deref().unwrap_or(""));
        let lower = haystack.to_lowercase();
        listing.condition = if lower.contains("used") {
            Some(Condition::Used)
        } else if lower.contains("new") {
            Some(Condition::New)
        } else {
            None
        };

        listing
    }

    /// Run discovery only, queueing found URLs. Returns (found, new).
    pub async fn discover(&self) -> anyhow::Result<(u64, u64)> {
        let found = self.scraper.discover().await?;
        let added = self.crawl.add_urls(&found)?;
        info!(
            "Discovery for {}: {} URLs found, {} new",
            self.source_id,
            found.len(),
            added
        );
        Ok((found.len() as u64, added))
    }

    /// Run the full pipeline.
    pub async fn run(
        &self,
        options: &IngestOptions,
        progress: Option<&ProgressBar>,
    ) -> anyhow::Result<IngestReport> {
        let mut report = IngestReport::default();

        let found = self.scraper.discover().await?;
        if options.dry_run {
            report.discovered = found.len() as u64;
        } else {
            report.discovered = self.crawl.add_urls(&found)?;
        }

        let pending = self
            .crawl
            .pending(self.source_id, options.limit, options.refresh)?;
        if let Some(pb) = progress {
            pb.set_length(pending.len() as u64);
        }
        info!(
            "Scraping {} pages for {} ({} newly discovered)",
            pending.len(),
            self.source_id,
            report.discovered
        );

        for crawl_url in pending {
            if let Some(pb) = progress {
                pb.set_message(crawl_url.url.clone());
                pb.inc(1);
            }
            if !options.dry_run {
                self.crawl.mark_fetching(self.source_id, &crawl_url.url)?;
            }

            match self.scraper.scrape_product(&crawl_url).await {
                Ok(scraped) if scraped.not_modified => {
                    report.unchanged += 1;
                    if !options.dry_run {
                        self.crawl
                            .mark_fetched(self.source_id, &crawl_url.url, None, None, None)?;
                    }
                }
                Ok(scraped) => {
                    report.fetched += 1;
                    let mut normalized = normalize(&scraped, self.source_id);
                    reconcile(&mut normalized);

                    if options.dry_run {
                        info!(
                            "[dry-run] {} -> {} ({} specs)",
                            crawl_url.url,
                            normalized.product.name,
                            normalized.specs.len()
                        );
                        continue;
                    }

                    let images: Vec<ProductImage> = normalized
                        .image_urls
                        .iter()
                        .enumerate()
                        .map(|(position, url)| {
                            ProductImage::new(
                                normalized.product.id.clone(),
                                url.clone(),
                                position as u32,
                            )
                        })
                        .collect();

                    match self
                        .products
                        .upsert(&normalized.product, &normalized.specs, &images)
                    {
                        Ok(UpsertOutcome::Created) => report.created += 1,
                        Ok(UpsertOutcome::Updated) => report.updated += 1,
                        Ok(UpsertOutcome::Unchanged) => report.unchanged += 1,
                        Err(e) => {
                            warn!("Failed to save {}: {}", crawl_url.url, e);
                            report.failed += 1;
                            self.crawl
                                .mark_failed(self.source_id, &crawl_url.url, &e.to_string())?;
                            continue;
                        }
                    }
                    if let Some(sink) = &self.listings {
                        let listing = self.dealer_listing(&normalized, &sink.profile_id);
                        if let Err(e) = sink.repo.upsert_by_owner_title(&listing) {
                            warn!("Failed to save listing for {}: {}", crawl_url.url, e);
                        }
                    }
                    self.crawl.mark_fetched(
                        self.source_id,
                        &crawl_url.url,
                        scraped.etag.as_deref(),
                        scraped.last_modified.as_deref(),
                        None,
                    )?;
                }
                Err(ScrapeError::NotHtml { url, content_type }) => {
                    warn!("Skipping {} ({})", url, content_type);
                    report.skipped += 1;
                    if !options.dry_run {
                        self.crawl.mark_skipped(
                            self.source_id,
                            &crawl_url.url,
                            &format!("not html: {}", content_type),
                        )?;
                    }
                }
                Err(e) => {
                    warn!("Failed to scrape {}: {}", crawl_url.url, e);
                    report.failed += 1;
                    if !options.dry_run {
                        self.crawl
                            .mark_failed(self.source_id, &crawl_url.url, &e.to_string())?;
                    }
                }
            }
        }

        if !options.dry_run {
            self.sources.touch_last_scraped(self.source_id)?;
        }
        Ok(report)
    }
}
