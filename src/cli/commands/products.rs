//! Product inspection commands.

use console::style;

use super::helpers::truncate;
use crate::config::Settings;
use crate::models::ManufacturerProduct;
use crate::repository::ProductRepository;

fn print_table(products: &[ManufacturerProduct]) {
    if products.is_empty() {
        println!("{} No products", style("!").yellow());
        return;
    }

    println!("{}", "-".repeat(100));
    println!(
        "{:<36} {:<28} {:<8} {:<6} {:<10} Source",
        "ID", "Name", "Tons", "Axles", "Gooseneck"
    );
    println!("{}", "-".repeat(100));
    for p in products {
        println!(
            "{:<36} {:<28} {:<8} {:<6} {:<10} {}",
            p.id,
            truncate(&p.name, 27),
            p.tonnage.map(|t| t.display()).unwrap_or_default(),
            p.axles.map(|a| a.to_string()).unwrap_or_default(),
            p.gooseneck.map(|g| g.as_str()).unwrap_or(""),
            p.source_id,
        );
    }
    println!("{} products", products.len());
}

/// List products, optionally for one source.
pub fn cmd_list(settings: &Settings, source: Option<&str>) -> anyhow::Result<()> {
    let repo = ProductRepository::new(&settings.database_path())?;
    let products = match source {
        Some(source_id) => repo.list_by_source(source_id)?,
        None => repo.list_all()?,
    };
    print_table(&products);
    Ok(())
}

/// Search products by name, series, or model number.
pub fn cmd_search(settings: &Settings, term: &str) -> anyhow::Result<()> {
    let repo = ProductRepository::new(&settings.database_path())?;
    let products = repo.search(term)?;
    print_table(&products);
    Ok(())
}

/// Show one product with its specs and images.
pub fn cmd_show(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let repo = ProductRepository::new(&settings.database_path())?;
    let Some(product) = repo.get(id)? else {
        println!("{} Product '{}' not found", style("✗").red(), id);
        return Ok(());
    };

    println!("\n{}", style(&product.name).bold());
    println!("  Source:     {}", product.source_id);
    println!("  URL:        {}", product.source_url);
    if let Some(series) = &product.series {
        println!("  Series:     {}", series);
    }
    if let Some(model) = &product.model_number {
        println!("  Model:      {}", model);
    }
    if let Some(category) = &product.category {
        println!("  Category:   {}", category);
    }
    if let Some(tonnage) = product.tonnage {
        println!("  Capacity:   {} ton", tonnage.display());
    }
    if let Some(axles) = product.axles {
        println!("  Axles:      {}", axles);
    }
    if let Some(gooseneck) = product.gooseneck {
        println!("  Gooseneck:  {}", gooseneck.label());
    }
    if let Some(length) = product.deck.length_in {
        println!("  Deck len:   {:.0} in", length);
    }
    if let Some(width) = product.deck.width_in {
        println!("  Deck width: {:.0} in", width);
    }
    if let Some(height) = product.deck.height_in {
        println!("  Deck ht:    {:.0} in", height);
    }
    if let Some(weight) = product.empty_weight_lbs {
        println!("  Empty wt:   {} lbs", weight);
    }
    if let Some(capacity) = product.capacity_lbs {
        println!("  Capacity:   {} lbs", capacity);
    }
    if product.metadata.get("reconciled").and_then(|v| v.as_bool()) == Some(true) {
        println!(
            "  {}",
            style("Some fields filled from the known-model table").dim()
        );
    }

    let specs = repo.get_specs(id)?;
    if !specs.is_empty() {
        println!("\n{}", style("Specs").bold());
        for spec in &specs {
            println!(
                "  [{}] {}: {}",
                spec.category.as_str(),
                spec.key,
                spec.value
            );
        }
    }

    let images = repo.get_images(id)?;
    if !images.is_empty() {
        println!("\n{}", style("Images").bold());
        for image in &images {
            let stored = image
                .stored_path
                .as_ref()
                .map(|p| format!(" -> {}", p.display()))
                .unwrap_or_default();
            println!("  {}{}", image.url, stored);
        }
    }
    Ok(())
}
