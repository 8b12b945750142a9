//! Initialize command.

use console::style;

use crate::config::{Config, Settings};
use crate::models::Source;
use crate::repository::{
    CrawlRepository, LeadRepository, ListingRepository, ProductRepository, SourceRepository,
};

/// Create the data directory, initialize the schema, and register the
/// sources declared in the config file.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let db = settings.database_path();
    // Constructors run each repository's schema DDL.
    let source_repo = SourceRepository::new(&db)?;
    ProductRepository::new(&db)?;
    ListingRepository::new(&db)?;
    LeadRepository::new(&db)?;
    CrawlRepository::new(&db)?;

    let mut sources_added = 0;
    for (source_id, site) in &config.sites {
        if !source_repo.exists(source_id)? {
            let source = Source::new(
                source_id.clone(),
                site.kind,
                site.name_or(source_id),
                site.base_url.clone(),
            );
            source_repo.save(&source)?;
            sources_added += 1;
            println!("  {} Added source: {}", style("✓").green(), source.name);
        }
    }

    if sources_added == 0 && config.sites.is_empty() {
        println!(
            "{} No sites configured in {}",
            style("!").yellow(),
            crate::config::CONFIG_FILE_NAME
        );
        println!("  Copy axles.example.toml to axles.toml to get started");
    }

    println!(
        "{} Initialized Axles in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    Ok(())
}
