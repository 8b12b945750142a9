//! Stats command.

use console::style;

use crate::config::Settings;
use crate::repository::{
    CrawlRepository, ListingRepository, ProductRepository, SourceRepository,
};

/// Per-source crawl, product, and listing counts.
pub fn cmd_stats(settings: &Settings) -> anyhow::Result<()> {
    let db = settings.database_path();
    let sources = SourceRepository::new(&db)?.get_all()?;
    let products = ProductRepository::new(&db)?;
    let crawl = CrawlRepository::new(&db)?;
    let listings = ListingRepository::new(&db)?;

    if sources.is_empty() {
        println!(
            "{} No sources registered. Run 'axles init' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Crawl and product counts").bold());
    println!("{}", "-".repeat(76));
    println!(
        "{:<15} {:>9} {:>9} {:>8} {:>8} {:>9} {:>9}",
        "Source", "Pending", "Fetched", "Failed", "Skipped", "Requests", "Products"
    );
    println!("{}", "-".repeat(76));

    let mut total_products = 0u64;
    for source in &sources {
        let stats = crawl.stats(&source.id)?;
        let count = products.count_by_source(&source.id)?;
        total_products += count;
        println!(
            "{:<15} {:>9} {:>9} {:>8} {:>8} {:>9} {:>9}",
            source.id,
            stats.discovered,
            stats.fetched,
            stats.failed,
            stats.skipped,
            stats.requests,
            count
        );
    }

    println!("{}", "-".repeat(76));
    println!(
        "{} products, {} listings",
        total_products,
        listings.count()?
    );
    Ok(())
}
