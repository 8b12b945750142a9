//! Spec normalization pipeline.
//!
//! Turns a raw scrape result into a `ManufacturerProduct`: classify every
//! raw key/value pair, populate the typed headline fields from the pairs
//! that parse, derive whatever is still missing from the product name,
//! and finally reconcile remaining gaps against the known-model table.

mod classify;
mod known_models;
mod parse;

pub use classify::classify_key;
pub use known_models::{lookup as lookup_known_model, KnownModel};
pub use parse::{
    detect_unit, parse_axles, parse_dimension_inches, parse_gooseneck, parse_model_designation,
    parse_price_cents, parse_tonnage, parse_weight_lbs, parse_year, ModelDesignation, LBS_PER_TON,
};

use crate::models::{ManufacturerProduct, ProductSpec, SpecCategory, TonnageRange};
use crate::scrapers::ScrapedProduct;

/// A product ready for upsert, with its categorized spec rows and the
/// image URLs found on the page.
#[derive(Debug, Clone)]
pub struct NormalizedProduct {
    pub product: ManufacturerProduct,
    pub specs: Vec<ProductSpec>,
    pub image_urls: Vec<String>,
}

/// Which deck field a spec key refers to.
fn deck_field(key: &str) -> Option<DeckField> {
    let lower = key.to_lowercase();
    if lower.contains("length") {
        Some(DeckField::Length)
    } else if lower.contains("width") {
        Some(DeckField::Width)
    } else if lower.contains("height") {
        Some(DeckField::Height)
    } else {
        None
    }
}

enum DeckField {
    Length,
    Width,
    Height,
}

/// Infer a category slug from the product name and gooseneck style.
fn infer_category(name: &str, has_gooseneck: bool) -> Option<String> {
    let lower = name.to_lowercase();
    let slug = if lower.contains("lowboy") || lower.contains("low boy") {
        "lowboy"
    } else if lower.contains("drop deck") || lower.contains("step deck") {
        "drop-deck"
    } else if lower.contains("flatbed") {
        "flatbed"
    } else if lower.contains("dump") {
        "dump"
    } else if lower.contains("tag") {
        "tag-trailer"
    } else if has_gooseneck {
        // Detachable-neck trailers without a body-style word are lowboys.
        "lowboy"
    } else {
        return None;
    };
    Some(slug.to_string())
}

/// Normalize a scrape result into a product with categorized specs.
///
/// Never fails: values that do not parse leave their typed field `None`
/// and survive untouched as raw spec rows. Within one page the first
/// parseable pair wins a typed field; the product name only fills fields
/// no pair claimed.
pub fn normalize(scraped: &ScrapedProduct, source_id: &str) -> NormalizedProduct {
    let mut product = ManufacturerProduct::new(
        source_id.to_string(),
        scraped.name.clone(),
        scraped.url.clone(),
    );
    product.description = scraped.description.clone();

    let mut specs = Vec::with_capacity(scraped.raw_specs.len());
    for (position, (key, value)) in scraped.raw_specs.iter().enumerate() {
        let category = classify_key(key);
        match category {
            SpecCategory::Capacity => {
                if product.tonnage.is_none() {
                    product.tonnage = parse_tonnage(value);
                }
                if product.capacity_lbs.is_none() {
                    product.capacity_lbs = parse_weight_lbs(value);
                }
            }
            SpecCategory::Axles => {
                if product.axles.is_none() {
                    product.axles = parse_axles(value);
                }
            }
            SpecCategory::Gooseneck => {
                if product.gooseneck.is_none() {
                    product.gooseneck = parse_gooseneck(value);
                }
            }
            SpecCategory::Deck => {
                if let Some(field) = deck_field(key) {
                    let parsed = parse_dimension_inches(value);
                    match field {
                        DeckField::Length if product.deck.length_in.is_none() => {
                            product.deck.length_in = parsed
                        }
                        DeckField::Width if product.deck.width_in.is_none() => {
                            product.deck.width_in = parsed
                        }
                        DeckField::Height if product.deck.height_in.is_none() => {
                            product.deck.height_in = parsed
                        }
                        _ => {}
                    }
                }
            }
            SpecCategory::Weight => {
                if product.empty_weight_lbs.is_none() {
                    product.empty_weight_lbs = parse_weight_lbs(value);
                }
            }
            _ => {}
        }

        specs.push(ProductSpec {
            id: 0,
            product_id: product.id.clone(),
            category,
            key: key.clone(),
            value: value.clone(),
            unit: detect_unit(value),
            position: position as u32,
        });
    }

    // Fill remaining gaps from the product name.
    let designation = parse_model_designation(&scraped.name);
    if product.series.is_none() {
        product.series = designation.series;
    }
    if product.model_number.is_none() {
        product.model_number = designation.designation;
    }
    if product.tonnage.is_none() {
        product.tonnage = designation.tonnage.map(TonnageRange::single);
    }
    if product.axles.is_none() {
        product.axles = designation.axles;
    }
    if product.gooseneck.is_none() {
        product.gooseneck = parse_gooseneck(&scraped.name);
    }
    product.category = infer_category(&scraped.name, product.gooseneck.is_some());

    product.metadata = serde_json::json!({
        "raw_spec_count": specs.len(),
    });

    NormalizedProduct {
        product,
        specs,
        image_urls: scraped.image_urls.clone(),
    }
}

/// Fill tonnage, axle, gooseneck, and category gaps from the known-model
/// table. Returns true if anything was filled; the product's metadata
/// records the reconciliation so downstream consumers can tell table
/// values from scraped ones.
pub fn reconcile(normalized: &mut NormalizedProduct) -> bool {
    let product = &mut normalized.product;
    let Some(series) = product.series.as_deref() else {
        return false;
    };
    let Some(known) = known_models::lookup(series) else {
        return false;
    };

    let mut filled = false;
    if product.tonnage.is_none() {
        product.tonnage = Some(TonnageRange::new(known.tonnage_min, known.tonnage_max));
        filled = true;
    }
    if product.axles.is_none() {
        product.axles = Some(known.axles);
        filled = true;
    }
    if product.gooseneck.is_none() {
        product.gooseneck = Some(known.gooseneck);
        filled = true;
    }
    if product.category.is_none() {
        product.category = Some(known.category.to_string());
        filled = true;
    }

    if filled {
        if let Some(map) = product.metadata.as_object_mut() {
            map.insert("reconciled".to_string(), serde_json::Value::Bool(true));
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GooseneckType;

    fn scraped(name: &str, raw_specs: Vec<(&str, &str)>) -> ScrapedProduct {
        let mut s = ScrapedProduct::new(
            "https://example.com/models/test".to_string(),
            name.to_string(),
        );
        s.raw_specs = raw_specs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        s
    }

    #[test]
    fn test_normalize_fills_typed_fields_from_specs() {
        let s = scraped(
            "55 Ton Lowboy",
            vec![
                ("Capacity", "55 Ton"),
                ("Axles", "3"),
                ("Gooseneck Style", "Hydraulic Detachable"),
                ("Deck Length", "26 ft"),
                ("Deck Width", "102\""),
                ("Deck Height", "18\""),
                ("Empty Weight", "24,500 lbs"),
                ("Floor", "Apitong wood"),
            ],
        );
        let n = normalize(&s, "talon");
        assert_eq!(n.product.tonnage, Some(TonnageRange::single(55)));
        assert_eq!(n.product.axles, Some(3));
        assert_eq!(n.product.gooseneck, Some(GooseneckType::Hydraulic));
        assert_eq!(n.product.deck.length_in, Some(312.0));
        assert_eq!(n.product.deck.width_in, Some(102.0));
        assert_eq!(n.product.deck.height_in, Some(18.0));
        assert_eq!(n.product.empty_weight_lbs, Some(24_500));
        assert_eq!(n.product.category.as_deref(), Some("lowboy"));
        assert_eq!(n.specs.len(), 8);
        // The wood floor stays as a raw General spec.
        assert_eq!(n.specs[7].category, SpecCategory::General);
    }

    #[test]
    fn test_normalize_derives_from_name_when_specs_miss() {
        let s = scraped("50 GSL-3", vec![("Floor", "Apitong wood")]);
        let n = normalize(&s, "talon");
        assert_eq!(n.product.tonnage, Some(TonnageRange::single(50)));
        assert_eq!(n.product.axles, Some(3));
        assert_eq!(n.product.series.as_deref(), Some("GSL"));
        assert_eq!(n.product.model_number.as_deref(), Some("50 GSL-3"));
    }

    #[test]
    fn test_normalize_first_pair_wins() {
        let s = scraped(
            "Lowboy",
            vec![("Capacity", "50 Ton"), ("Rated Capacity", "60 Ton")],
        );
        let n = normalize(&s, "talon");
        assert_eq!(n.product.tonnage, Some(TonnageRange::single(50)));
    }

    #[test]
    fn test_normalize_never_fails_on_garbage() {
        let s = scraped("", vec![("Capacity", "call for details"), ("", "")]);
        let n = normalize(&s, "talon");
        assert_eq!(n.product.tonnage, None);
        assert_eq!(n.specs.len(), 2);
    }

    #[test]
    fn test_reconcile_fills_gaps_from_known_models() {
        let s = scraped("GSL-3 Series", vec![]);
        let mut n = normalize(&s, "talon");
        // Name gave series and axles but no tonnage or gooseneck.
        assert_eq!(n.product.tonnage, None);
        assert!(reconcile(&mut n));
        assert_eq!(n.product.tonnage, Some(TonnageRange::new(35, 60)));
        assert_eq!(n.product.axles, Some(3));
        assert_eq!(n.product.gooseneck, Some(GooseneckType::Hydraulic));
        assert_eq!(n.product.metadata["reconciled"], true);
    }

    #[test]
    fn test_reconcile_never_overrides_scraped_values() {
        let s = scraped("50 GSL-3", vec![("Gooseneck", "Mechanical")]);
        let mut n = normalize(&s, "talon");
        assert_eq!(n.product.gooseneck, Some(GooseneckType::Mechanical));
        reconcile(&mut n);
        // Table says hydraulic for GSL, but the page said mechanical.
        assert_eq!(n.product.gooseneck, Some(GooseneckType::Mechanical));
        assert_eq!(n.product.tonnage, Some(TonnageRange::single(50)));
    }

    #[test]
    fn test_reconcile_without_series_is_noop() {
        let s = scraped("Generic Trailer", vec![]);
        let mut n = normalize(&s, "talon");
        assert!(!reconcile(&mut n));
    }
}
