//! Seed command: products into draft listings.

use console::style;

use crate::config::Settings;
use crate::repository::{ListingRepository, ProductRepository, SourceRepository};
use crate::services::SeedService;

/// Seed draft listings from a source's products.
pub fn cmd_seed(settings: &Settings, source_id: &str, profile_id: &str) -> anyhow::Result<()> {
    let db = settings.database_path();
    let products = ProductRepository::new(&db)?;
    let listings = ListingRepository::new(&db)?;
    let sources = SourceRepository::new(&db)?;

    let service = SeedService::new(&products, &listings, &sources);
    let report = service.seed_listings(source_id, profile_id)?;

    println!(
        "{} Seeded {} listings ({} new, {} updated)",
        style("✓").green(),
        report.created + report.updated,
        report.created,
        report.updated
    );
    Ok(())
}
