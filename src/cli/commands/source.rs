//! Source management commands.

use console::style;

use super::helpers::truncate;
use crate::config::Settings;
use crate::models::{Source, SourceKind};
use crate::repository::{CrawlRepository, ProductRepository, SourceRepository};

/// List known sources.
pub fn cmd_list(settings: &Settings) -> anyhow::Result<()> {
    let source_repo = SourceRepository::new(&settings.database_path())?;
    let sources = source_repo.get_all()?;

    if sources.is_empty() {
        println!(
            "{} No sources registered. Run 'axles init' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Sources").bold());
    println!("{}", "-".repeat(72));
    println!(
        "{:<15} {:<25} {:<13} Last Scraped",
        "ID", "Name", "Kind"
    );
    println!("{}", "-".repeat(72));

    for source in sources {
        let last_scraped = source
            .last_scraped
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "Never".to_string());
        println!(
            "{:<15} {:<25} {:<13} {}",
            source.id,
            truncate(&source.name, 24),
            source.kind.as_str(),
            last_scraped
        );
    }
    Ok(())
}

/// Add a source by hand.
pub fn cmd_add(
    settings: &Settings,
    id: &str,
    base_url: &str,
    name: Option<String>,
    kind: SourceKind,
) -> anyhow::Result<()> {
    let source_repo = SourceRepository::new(&settings.database_path())?;
    if source_repo.exists(id)? {
        println!("{} Source '{}' already exists", style("✗").red(), id);
        return Ok(());
    }

    let source = Source::new(
        id.to_string(),
        kind,
        name.unwrap_or_else(|| id.to_string()),
        base_url.to_string(),
    );
    source_repo.save(&source)?;
    println!("{} Added source: {}", style("✓").green(), source.id);
    println!(
        "  Add a [sites.{}] section to {} to make it scrapeable",
        source.id,
        crate::config::CONFIG_FILE_NAME
    );
    Ok(())
}

/// Remove a source.
pub fn cmd_remove(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let source_repo = SourceRepository::new(&settings.database_path())?;
    if source_repo.delete(id)? {
        println!("{} Removed source '{}'", style("✓").green(), id);
    } else {
        println!("{} Source '{}' not found", style("✗").red(), id);
    }
    Ok(())
}

/// Show one source with its crawl state.
pub fn cmd_show(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let db = settings.database_path();
    let source_repo = SourceRepository::new(&db)?;
    let Some(source) = source_repo.get(id)? else {
        println!("{} Source '{}' not found", style("✗").red(), id);
        return Ok(());
    };

    let crawl_repo = CrawlRepository::new(&db)?;
    let product_repo = ProductRepository::new(&db)?;
    let stats = crawl_repo.stats(id)?;
    let products = product_repo.count_by_source(id)?;

    println!("\n{}", style(&source.name).bold());
    println!("  ID:           {}", source.id);
    println!("  Kind:         {}", source.kind.as_str());
    println!("  Base URL:     {}", source.base_url);
    println!(
        "  Last scraped: {}",
        source
            .last_scraped
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "Never".to_string())
    );
    println!("  Products:     {}", products);
    println!(
        "  URLs:         {} pending, {} fetched, {} failed, {} skipped",
        stats.discovered, stats.fetched, stats.failed, stats.skipped
    );
    println!("  Requests:     {}", stats.requests);
    Ok(())
}
