//! Repository round-trip tests against temporary databases.

use axles::models::{
    CrawlUrl, DiscoveryMethod, Lead, Listing, ListingStatus, ManufacturerProduct, ProductImage,
    ProductSpec, Profile, Source, SourceKind, SpecCategory, TonnageRange, UrlStatus,
};
use axles::repository::{
    CrawlRepository, LeadRepository, ListingFilter, ListingRepository, ProductRepository,
    SourceRepository, UpsertOutcome,
};

fn temp_db() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("axles.db");
    (dir, path)
}

fn sample_product() -> (ManufacturerProduct, Vec<ProductSpec>, Vec<ProductImage>) {
    let mut product = ManufacturerProduct::new(
        "talon".to_string(),
        "50 GSL-3".to_string(),
        "https://talon.example/models/50-gsl-3".to_string(),
    );
    product.series = Some("GSL".to_string());
    product.model_number = Some("50 GSL-3".to_string());
    product.category = Some("lowboy".to_string());
    product.tonnage = Some(TonnageRange::single(50));
    product.axles = Some(3);
    product.deck.length_in = Some(312.0);
    product.empty_weight_lbs = Some(24_500);

    let specs = vec![
        ProductSpec {
            id: 0,
            product_id: product.id.clone(),
            category: SpecCategory::Capacity,
            key: "Capacity".to_string(),
            value: "50 Ton".to_string(),
            unit: Some("ton".to_string()),
            position: 0,
        },
        ProductSpec {
            id: 0,
            product_id: product.id.clone(),
            category: SpecCategory::Axles,
            key: "Axles".to_string(),
            value: "3".to_string(),
            unit: None,
            position: 1,
        },
    ];
    let images = vec![ProductImage::new(
        product.id.clone(),
        "https://talon.example/img/gsl.jpg".to_string(),
        0,
    )];
    (product, specs, images)
}

#[test]
fn product_upsert_roundtrip_preserves_fields() {
    let (_dir, db) = temp_db();
    let repo = ProductRepository::new(&db).unwrap();
    let (product, specs, images) = sample_product();

    let outcome = repo.upsert(&product, &specs, &images).unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);

    let loaded = repo
        .get_by_url("talon", &product.source_url)
        .unwrap()
        .expect("product exists");
    assert_eq!(loaded.id, product.id);
    assert_eq!(loaded.name, "50 GSL-3");
    assert_eq!(loaded.series.as_deref(), Some("GSL"));
    assert_eq!(loaded.tonnage, Some(TonnageRange::single(50)));
    assert_eq!(loaded.axles, Some(3));
    assert_eq!(loaded.deck.length_in, Some(312.0));
    assert_eq!(loaded.empty_weight_lbs, Some(24_500));

    let loaded_specs = repo.get_specs(&product.id).unwrap();
    assert_eq!(loaded_specs.len(), 2);
    assert_eq!(loaded_specs[0].key, "Capacity");
    assert_eq!(loaded_specs[0].category, SpecCategory::Capacity);
    assert_eq!(loaded_specs[1].value, "3");

    let loaded_images = repo.get_images(&product.id).unwrap();
    assert_eq!(loaded_images.len(), 1);
    assert!(loaded_images[0].stored_path.is_none());
}

#[test]
fn product_upsert_is_idempotent_and_detects_changes() {
    let (_dir, db) = temp_db();
    let repo = ProductRepository::new(&db).unwrap();
    let (product, specs, images) = sample_product();

    repo.upsert(&product, &specs, &images).unwrap();
    let first = repo.get_by_url("talon", &product.source_url).unwrap().unwrap();

    // Identical re-scrape: no change, updated_at untouched.
    let (rescrape, specs2, images2) = sample_product();
    let outcome = repo.upsert(&rescrape, &specs2, &images2).unwrap();
    assert_eq!(outcome, UpsertOutcome::Unchanged);
    let second = repo.get_by_url("talon", &product.source_url).unwrap().unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.updated_at, first.updated_at);

    // Changed tonnage: update in place under the same id.
    let (mut changed, specs3, images3) = sample_product();
    changed.tonnage = Some(TonnageRange::new(35, 55));
    let outcome = repo.upsert(&changed, &specs3, &images3).unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    let third = repo.get_by_url("talon", &product.source_url).unwrap().unwrap();
    assert_eq!(third.id, first.id);
    assert_eq!(third.tonnage, Some(TonnageRange::new(35, 55)));
}

#[test]
fn product_image_merge_keeps_download_state() {
    let (_dir, db) = temp_db();
    let repo = ProductRepository::new(&db).unwrap();
    let (product, specs, images) = sample_product();
    repo.upsert(&product, &specs, &images).unwrap();

    repo.mark_image_stored(
        &product.id,
        &images[0].url,
        std::path::Path::new("/media/ab/abcdef12.jpg"),
        "abcdef12",
    )
    .unwrap();

    // Re-upsert with the same image plus a new one.
    let mut more_images = images.clone();
    more_images.push(ProductImage::new(
        product.id.clone(),
        "https://talon.example/img/gsl-rear.jpg".to_string(),
        1,
    ));
    repo.upsert(&product, &specs, &more_images).unwrap();

    let loaded = repo.get_images(&product.id).unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].stored_path.is_some(), "download state survived");
    assert!(loaded[1].stored_path.is_none());

    let pending = repo.pending_images("talon").unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, "https://talon.example/img/gsl-rear.jpg");
}

#[test]
fn listing_upsert_enforces_owner_title_uniqueness() {
    let (_dir, db) = temp_db();
    let repo = ListingRepository::new(&db).unwrap();

    let profile = Profile::new("Midwest Trailer Sales".to_string());
    repo.save_profile(&profile).unwrap();

    let mut listing = Listing::new(profile.id.clone(), "2024 50 Ton Lowboy".to_string());
    listing.price_cents = Some(12_500_000);
    listing.status = ListingStatus::Active;
    assert!(repo.upsert_by_owner_title(&listing).unwrap());

    // Same owner and title: update, not a second row.
    let mut duplicate = Listing::new(profile.id.clone(), "2024 50 Ton Lowboy".to_string());
    duplicate.price_cents = Some(11_900_000);
    assert!(!repo.upsert_by_owner_title(&duplicate).unwrap());
    assert_eq!(repo.count().unwrap(), 1);

    let loaded = repo
        .get_by_owner_title(&profile.id, "2024 50 Ton Lowboy")
        .unwrap()
        .unwrap();
    assert_eq!(loaded.id, listing.id, "first row kept its id");
    assert_eq!(loaded.price_cents, Some(11_900_000));
}

#[test]
fn listing_filters() {
    let (_dir, db) = temp_db();
    let repo = ListingRepository::new(&db).unwrap();
    let profile = Profile::new("Dealer".to_string());
    repo.save_profile(&profile).unwrap();

    for (title, price, status) in [
        ("A", Some(100_00), ListingStatus::Active),
        ("B", Some(500_00), ListingStatus::Active),
        ("C", None, ListingStatus::Draft),
    ] {
        let mut listing = Listing::new(profile.id.clone(), title.to_string());
        listing.price_cents = price;
        listing.status = status;
        repo.upsert_by_owner_title(&listing).unwrap();
    }

    let active = repo
        .list(&ListingFilter {
            status: Some(ListingStatus::Active),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(active.len(), 2);

    let expensive = repo
        .list(&ListingFilter {
            min_price_cents: Some(200_00),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(expensive.len(), 1);
    assert_eq!(expensive[0].title, "B");
}

#[test]
fn lead_capture_and_recent() {
    let (_dir, db) = temp_db();
    let repo = LeadRepository::new(&db).unwrap();

    let mut lead = Lead::new(
        "Pat Doe".to_string(),
        "555-0100".to_string(),
        "Interested in the 50 ton lowboy".to_string(),
        "phone_call".to_string(),
    );
    lead.profile_id = Some("dealer-1".to_string());
    repo.insert(&lead).unwrap();

    let recent = repo.recent_for_profile("dealer-1", 10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].name, "Pat Doe");
    assert_eq!(recent[0].status, axles::models::LeadStatus::New);
}

#[test]
fn crawl_url_lifecycle() {
    let (_dir, db) = temp_db();
    let repo = CrawlRepository::new(&db).unwrap();

    let urls = vec![
        CrawlUrl::new(
            "https://talon.example/models/a".to_string(),
            "talon".to_string(),
            DiscoveryMethod::Sitemap,
            None,
            0,
        ),
        CrawlUrl::new(
            "https://talon.example/models/b".to_string(),
            "talon".to_string(),
            DiscoveryMethod::Link,
            Some("https://talon.example/models".to_string()),
            1,
        ),
    ];
    assert_eq!(repo.add_urls(&urls).unwrap(), 2);
    // Re-adding is ignored.
    assert_eq!(repo.add_urls(&urls).unwrap(), 0);

    let pending = repo.pending("talon", None, false).unwrap();
    assert_eq!(pending.len(), 2);

    repo.mark_fetched(
        "talon",
        "https://talon.example/models/a",
        Some("\"etag-1\""),
        None,
        None,
    )
    .unwrap();
    let a = repo.get("talon", "https://talon.example/models/a").unwrap().unwrap();
    assert_eq!(a.status, UrlStatus::Fetched);
    assert_eq!(a.etag.as_deref(), Some("\"etag-1\""));

    // Failures requeue until retries run out.
    for _ in 0..3 {
        repo.mark_failed("talon", "https://talon.example/models/b", "timeout")
            .unwrap();
    }
    let b = repo.get("talon", "https://talon.example/models/b").unwrap().unwrap();
    assert_eq!(b.status, UrlStatus::Failed);
    assert_eq!(b.retry_count, 3);
    assert_eq!(b.last_error.as_deref(), Some("timeout"));

    // Only the fetched URL comes back in refresh mode.
    let pending = repo.pending("talon", None, false).unwrap();
    assert!(pending.is_empty());
    let refresh = repo.pending("talon", None, true).unwrap();
    assert_eq!(refresh.len(), 1);
    assert_eq!(refresh[0].url, "https://talon.example/models/a");
}

#[test]
fn source_roundtrip() {
    let (_dir, db) = temp_db();
    let repo = SourceRepository::new(&db).unwrap();

    let source = Source::new(
        "talon".to_string(),
        SourceKind::Manufacturer,
        "Talon Trailers".to_string(),
        "https://talon.example".to_string(),
    );
    repo.save(&source).unwrap();
    assert!(repo.exists("talon").unwrap());

    let loaded = repo.get("talon").unwrap().unwrap();
    assert_eq!(loaded.name, "Talon Trailers");
    assert_eq!(loaded.kind, SourceKind::Manufacturer);
    assert!(loaded.last_scraped.is_none());

    repo.touch_last_scraped("talon").unwrap();
    let touched = repo.get("talon").unwrap().unwrap();
    assert!(touched.last_scraped.is_some());

    assert!(repo.delete("talon").unwrap());
    assert!(!repo.exists("talon").unwrap());
}
