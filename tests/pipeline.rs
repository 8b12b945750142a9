//! End-to-end pipeline test: extract a fixture page, normalize it,
//! reconcile against the known-model table, and upsert into a temporary
//! database. No network involved.

use axles::models::{GooseneckType, ProductImage, SpecCategory, TonnageRange};
use axles::normalize::{normalize, reconcile};
use axles::repository::{ProductRepository, UpsertOutcome};
use axles::scrapers::extract::extract_product;
use axles::scrapers::{ExtractConfig, ScrapedProduct};

const FIXTURE: &str = r##"
    <html>
    <head>
        <meta property="og:title" content="50 GSL-3">
        <meta name="description" content="Severe duty lowboy for tracked equipment.">
        <meta property="og:image" content="/img/gsl-hero.jpg">
    </head>
    <body>
        <h1>50 GSL-3</h1>
        <table>
            <tr><th>Capacity</th><td>100,000 lbs</td></tr>
            <tr><th>Deck Length</th><td>26 ft</td></tr>
            <tr><th>Deck Height</th><td>18"</td></tr>
            <tr><th>Empty Weight</th><td>22,800 lbs</td></tr>
            <tr><th>Suspension</th><td>Air ride</td></tr>
        </table>
        <img src="/img/gsl-side.jpg">
    </body>
    </html>
"##;

const PAGE_URL: &str = "https://talon.example/models/50-gsl-3";

fn scraped_fixture() -> ScrapedProduct {
    let extracted = extract_product(FIXTURE, PAGE_URL, &ExtractConfig::default());
    let mut scraped = ScrapedProduct::new(
        PAGE_URL.to_string(),
        extracted.name.expect("fixture has a name"),
    );
    scraped.description = extracted.description;
    scraped.raw_specs = extracted.raw_specs;
    scraped.image_urls = extracted.image_urls;
    scraped
}

#[test]
fn pipeline_extracts_normalizes_and_reconciles() {
    let scraped = scraped_fixture();
    assert_eq!(scraped.name, "50 GSL-3");
    assert_eq!(scraped.raw_specs.len(), 5);

    let mut normalized = normalize(&scraped, "talon");
    let product = &normalized.product;

    // From the spec table: 100,000 lbs converts to 50 tons.
    assert_eq!(product.tonnage, Some(TonnageRange::single(50)));
    assert_eq!(product.capacity_lbs, Some(100_000));
    assert_eq!(product.deck.length_in, Some(312.0));
    assert_eq!(product.deck.height_in, Some(18.0));
    assert_eq!(product.empty_weight_lbs, Some(22_800));
    // From the name: series and axle count.
    assert_eq!(product.series.as_deref(), Some("GSL"));
    assert_eq!(product.axles, Some(3));
    // The page never states the gooseneck; the known-model table does.
    assert_eq!(product.gooseneck, None);
    assert!(reconcile(&mut normalized));
    assert_eq!(
        normalized.product.gooseneck,
        Some(GooseneckType::Hydraulic)
    );
    // Scraped tonnage survived reconciliation.
    assert_eq!(
        normalized.product.tonnage,
        Some(TonnageRange::single(50))
    );

    // Every raw pair survived, categorized.
    assert_eq!(normalized.specs.len(), 5);
    assert_eq!(normalized.specs[4].category, SpecCategory::Suspension);
}

#[test]
fn pipeline_result_roundtrips_through_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("axles.db");
    let repo = ProductRepository::new(&db).unwrap();

    let scraped = scraped_fixture();
    let mut normalized = normalize(&scraped, "talon");
    reconcile(&mut normalized);

    let images: Vec<ProductImage> = normalized
        .image_urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            ProductImage::new(normalized.product.id.clone(), url.clone(), i as u32)
        })
        .collect();
    assert_eq!(images.len(), 2, "og:image plus inline img");

    let outcome = repo
        .upsert(&normalized.product, &normalized.specs, &images)
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);

    let loaded = repo.get_by_url("talon", PAGE_URL).unwrap().unwrap();
    assert_eq!(loaded.name, "50 GSL-3");
    assert_eq!(loaded.tonnage, Some(TonnageRange::single(50)));
    assert_eq!(loaded.axles, Some(3));
    assert_eq!(loaded.gooseneck, Some(GooseneckType::Hydraulic));
    assert_eq!(
        loaded.description.as_deref(),
        Some("Severe duty lowboy for tracked equipment.")
    );
    assert_eq!(
        loaded.metadata.get("reconciled").and_then(|v| v.as_bool()),
        Some(true)
    );

    // Scraping the same page again changes nothing.
    let rescrape = scraped_fixture();
    let mut renormalized = normalize(&rescrape, "talon");
    reconcile(&mut renormalized);
    let images: Vec<ProductImage> = renormalized
        .image_urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            ProductImage::new(renormalized.product.id.clone(), url.clone(), i as u32)
        })
        .collect();
    let outcome = repo
        .upsert(&renormalized.product, &renormalized.specs, &images)
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Unchanged);
}
