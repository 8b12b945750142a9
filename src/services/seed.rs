//! Seed marketplace listings from normalized products.
//!
//! Turns a source's manufacturer products into draft listings for one
//! dealer profile, carrying over the product images. Honors the
//! one-listing-per-(profile, title) rule via the listing upsert.

use tracing::info;

use crate::models::{Condition, Listing, ListingImage, ManufacturerProduct};
use crate::repository::{ListingRepository, ProductRepository, SourceRepository};

/// Counters from one seed run.
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub created: u64,
    pub updated: u64,
}

/// Build a listing title from the source name and product name.
/// Products already prefixed with the brand keep their name as-is.
pub fn listing_title(source_name: &str, product: &ManufacturerProduct) -> String {
    if product
        .name
        .to_lowercase()
        .contains(&source_name.to_lowercase())
    {
        product.name.clone()
    } else {
        format!("{} {}", source_name, product.name)
    }
}

/// Creates draft listings from manufacturer products.
pub struct SeedService<'a> {
    products: &'a ProductRepository,
    listings: &'a ListingRepository,
    sources: &'a SourceRepository,
}

impl<'a> SeedService<'a> {
    pub fn new(
        products: &'a ProductRepository,
        listings: &'a ListingRepository,
        sources: &'a SourceRepository,
    ) -> Self {
        Self {
            products,
            listings,
            sources,
        }
    }

    /// Seed every product of a source as a draft listing owned by
    /// `profile_id`.
    pub fn seed_listings(&self, source_id: &str, profile_id: &str) -> anyhow::Result<SeedReport> {
        let source = self
            .sources
            .get(source_id)?
            .ok_or_else(|| anyhow::anyhow!("source '{}' not found", source_id))?;
        let profile = self
            .listings
            .get_profile(profile_id)?
            .ok_or_else(|| anyhow::anyhow!("profile '{}' not found", profile_id))?;

        let mut report = SeedReport::default();
        for product in self.products.list_by_source(source_id)? {
            let title = listing_title(&source.name, &product);
            let mut listing = Listing::new(profile.id.clone(), title);
            listing.description = product.description.clone();
            listing.make = Some(source.name.clone());
            listing.model = product
                .model_number
                .clone()
                .or_else(|| product.series.clone());
            listing.category = product.category.clone();
            listing.condition = Some(Condition::New);
            listing.source_url = Some(product.source_url.clone());

            if self.listings.upsert_by_owner_title(&listing)? {
                report.created += 1;
            } else {
                report.updated += 1;
            }

            // Carry product images over to the listing.
            let saved = self
                .listings
                .get_by_owner_title(&listing.profile_id, &listing.title)?
                .ok_or_else(|| anyhow::anyhow!("listing missing after upsert"))?;
            let images: Vec<ListingImage> = self
                .products
                .get_images(&product.id)?
                .into_iter()
                .map(|image| ListingImage {
                    id: 0,
                    listing_id: saved.id.clone(),
                    url: image.url,
                    position: image.position,
                })
                .collect();
            if !images.is_empty() {
                self.listings.set_images(&saved.id, &images)?;
            }
        }

        info!(
            "Seeded {} listings ({} new) from {} for profile {}",
            report.created + report.updated,
            report.created,
            source_id,
            profile_id
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_title_prefixes_brand() {
        let product = ManufacturerProduct::new(
            "talon".to_string(),
            "50 GSL-3".to_string(),
            "https://talon.example/models/50-gsl-3".to_string(),
        );
        assert_eq!(
            listing_title("Talon Trailers", &product),
            "Talon Trailers 50 GSL-3"
        );
    }

    #[test]
    fn test_listing_title_keeps_branded_names() {
        let product = ManufacturerProduct::new(
            "talon".to_string(),
            "Talon Trailers 50 GSL-3".to_string(),
            "https://talon.example/models/50-gsl-3".to_string(),
        );
        assert_eq!(
            listing_title("Talon Trailers", &product),
            "Talon Trailers 50 GSL-3"
        );
    }
}
