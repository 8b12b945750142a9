//! Discover and scrape commands.

use console::style;

use super::helpers::{build_scraper, progress_bar};
use crate::config::{Config, Settings};
use crate::models::{Profile, SourceKind};
use crate::repository::{
    CrawlRepository, ListingRepository, ProductRepository, SourceRepository,
};
use crate::scrapers::{load_rate_limit_state, save_rate_limit_state};
use crate::services::{IngestOptions, IngestReport, IngestService, MediaService};

/// Flags shared by scrape runs.
#[derive(Debug, Clone, Default)]
pub struct ScrapeArgs {
    pub limit: Option<u32>,
    pub refresh: bool,
    pub dry_run: bool,
    pub no_images: bool,
}

/// Run discovery only for one source.
pub async fn cmd_discover(
    settings: &Settings,
    config: &Config,
    source_id: &str,
) -> anyhow::Result<()> {
    let Some(site) = config.site(source_id) else {
        println!(
            "{} No [sites.{}] section in {}",
            style("✗").red(),
            source_id,
            crate::config::CONFIG_FILE_NAME
        );
        return Ok(());
    };

    let (limiter, _client, scraper) = build_scraper(source_id, site, settings)?;
    load_rate_limit_state(&limiter, &settings.rate_limit_state_path()).await?;

    let db = settings.database_path();
    let products = ProductRepository::new(&db)?;
    let crawl = CrawlRepository::new(&db)?;
    let sources = SourceRepository::new(&db)?;
    let service = IngestService::new(source_id, &scraper, &products, &crawl, &sources);

    println!("{} Discovering product URLs for {}...", style("→").cyan(), source_id);
    let (found, added) = service.discover().await?;
    save_rate_limit_state(&limiter, &settings.rate_limit_state_path()).await?;

    println!(
        "{} Found {} product URLs ({} new)",
        style("✓").green(),
        found,
        added
    );
    Ok(())
}

/// Run the full pipeline for one source or all configured sources.
pub async fn cmd_scrape(
    settings: &Settings,
    config: &Config,
    source_id: Option<&str>,
    all: bool,
    args: &ScrapeArgs,
) -> anyhow::Result<()> {
    let targets: Vec<String> = if all {
        config.sites.keys().cloned().collect()
    } else {
        match source_id {
            Some(id) => vec![id.to_string()],
            None => {
                println!(
                    "{} Give a source ID or pass --all",
                    style("✗").red()
                );
                return Ok(());
            }
        }
    };

    if targets.is_empty() {
        println!(
            "{} No sites configured in {}",
            style("!").yellow(),
            crate::config::CONFIG_FILE_NAME
        );
        return Ok(());
    }

    for target in &targets {
        if let Err(e) = scrape_one(settings, config, target, args).await {
            // One broken site must not stop an --all run.
            println!("{} {} failed: {}", style("✗").red(), target, e);
        }
    }
    Ok(())
}

async fn scrape_one(
    settings: &Settings,
    config: &Config,
    source_id: &str,
    args: &ScrapeArgs,
) -> anyhow::Result<()> {
    let Some(site) = config.site(source_id) else {
        anyhow::bail!(
            "no [sites.{}] section in {}",
            source_id,
            crate::config::CONFIG_FILE_NAME
        );
    };

    let (limiter, client, scraper) = build_scraper(source_id, site, settings)?;
    let state_path = settings.rate_limit_state_path();
    load_rate_limit_state(&limiter, &state_path).await?;

    let db = settings.database_path();
    let products = ProductRepository::new(&db)?;
    let crawl = CrawlRepository::new(&db)?;
    let sources = SourceRepository::new(&db)?;
    let listings = ListingRepository::new(&db)?;

    let mut service = IngestService::new(source_id, &scraper, &products, &crawl, &sources);

    // Dealer inventory also lands in the listings table, owned by a
    // profile named after the site.
    if site.kind == SourceKind::Dealer && !args.dry_run {
        let company = site.name_or(source_id);
        let profile = match listings.find_profile_by_company(&company)? {
            Some(profile) => profile,
            None => {
                let profile = Profile::new(company);
                listings.save_profile(&profile)?;
                profile
            }
        };
        service = service.with_listing_sink(&listings, profile.id);
    }

    let options = IngestOptions {
        limit: args.limit,
        refresh: args.refresh,
        dry_run: args.dry_run,
    };

    println!(
        "{} Scraping {}{}",
        style("→").cyan(),
        source_id,
        if args.dry_run { " (dry run)" } else { "" }
    );
    let pb = progress_bar();
    let report = service.run(&options, Some(&pb)).await?;
    pb.finish_and_clear();
    print_report(source_id, &report);

    if !args.no_images && !args.dry_run {
        let pb = progress_bar();
        pb.set_message("Downloading images...");
        let media = MediaService::new(&client, &products, settings.media_dir());
        let media_report = media.download_pending(source_id, Some(&pb)).await?;
        pb.finish_and_clear();
        if media_report.downloaded + media_report.failed > 0 {
            println!(
                "  Images: {} downloaded, {} failed",
                media_report.downloaded, media_report.failed
            );
        }
    }

    save_rate_limit_state(&limiter, &state_path).await?;
    Ok(())
}

fn print_report(source_id: &str, report: &IngestReport) {
    println!(
        "{} {}: {} new URLs, {} fetched | {} created, {} updated, {} unchanged, {} skipped, {} failed",
        style("✓").green(),
        source_id,
        report.discovered,
        report.fetched,
        report.created,
        report.updated,
        report.unchanged,
        report.skipped,
        report.failed,
    );
}
