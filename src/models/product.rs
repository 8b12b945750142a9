//! Manufacturer product models.
//!
//! A product is one catalog entry scraped from a manufacturer site: a
//! trailer or truck model with its normalized headline specs (tonnage,
//! axle count, gooseneck style, deck dimensions, weights) plus every raw
//! spec pair the page carried, categorized but otherwise untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rated capacity in whole tons, as a range.
///
/// Manufacturer pages quote capacity as a single figure ("50 Ton") or a
/// band ("35-55 ton"); single figures are stored with `min == max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonnageRange {
    pub min: u32,
    pub max: u32,
}

impl TonnageRange {
    /// Create a range, swapping the bounds if given out of order.
    pub fn new(min: u32, max: u32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A single-value range.
    pub fn single(tons: u32) -> Self {
        Self {
            min: tons,
            max: tons,
        }
    }

    pub fn is_single(&self) -> bool {
        self.min == self.max
    }

    /// Display form: "50" or "35-55".
    pub fn display(&self) -> String {
        if self.is_single() {
            self.min.to_string()
        } else {
            format!("{}-{}", self.min, self.max)
        }
    }
}

/// Deck dimensions in inches. Fields the page did not state stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckDimensions {
    pub length_in: Option<f64>,
    pub width_in: Option<f64>,
    pub height_in: Option<f64>,
}

impl DeckDimensions {
    pub fn is_empty(&self) -> bool {
        self.length_in.is_none() && self.width_in.is_none() && self.height_in.is_none()
    }
}

/// Gooseneck/coupling style of a trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GooseneckType {
    /// Removable gooseneck (RGN) - detaches so equipment can drive on.
    Removable,
    /// Fixed gooseneck - welded, loaded from the rear.
    Fixed,
    /// Mechanically detachable gooseneck.
    Mechanical,
    /// Hydraulically detachable gooseneck.
    Hydraulic,
    /// Non-ground-bearing detachable gooseneck.
    NonGround,
}

impl GooseneckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Removable => "removable",
            Self::Fixed => "fixed",
            Self::Mechanical => "mechanical",
            Self::Hydraulic => "hydraulic",
            Self::NonGround => "non_ground",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "removable" => Some(Self::Removable),
            "fixed" => Some(Self::Fixed),
            "mechanical" => Some(Self::Mechanical),
            "hydraulic" => Some(Self::Hydraulic),
            "non_ground" => Some(Self::NonGround),
            _ => None,
        }
    }

    /// Label used in listing titles and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Removable => "RGN",
            Self::Fixed => "Fixed Gooseneck",
            Self::Mechanical => "Mechanical RGN",
            Self::Hydraulic => "Hydraulic RGN",
            Self::NonGround => "Non-Ground-Bearing RGN",
        }
    }
}

/// Semantic bucket a raw spec key is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecCategory {
    Capacity,
    Axles,
    Gooseneck,
    Deck,
    Weight,
    Dimensions,
    Suspension,
    Tires,
    Electrical,
    General,
}

impl SpecCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::Axles => "axles",
            Self::Gooseneck => "gooseneck",
            Self::Deck => "deck",
            Self::Weight => "weight",
            Self::Dimensions => "dimensions",
            Self::Suspension => "suspension",
            Self::Tires => "tires",
            Self::Electrical => "electrical",
            Self::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "capacity" => Some(Self::Capacity),
            "axles" => Some(Self::Axles),
            "gooseneck" => Some(Self::Gooseneck),
            "deck" => Some(Self::Deck),
            "weight" => Some(Self::Weight),
            "dimensions" => Some(Self::Dimensions),
            "suspension" => Some(Self::Suspension),
            "tires" => Some(Self::Tires),
            "electrical" => Some(Self::Electrical),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// A normalized manufacturer product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufacturerProduct {
    /// UUID, assigned on first insert.
    pub id: String,
    pub source_id: String,
    /// Product name as shown on the page, e.g. "55 Ton Hydraulic RGN".
    pub name: String,
    /// Model family, e.g. "GSL".
    pub series: Option<String>,
    /// Full model designation, e.g. "50 GSL-3".
    pub model_number: Option<String>,
    /// Category slug, e.g. "lowboy" or "flatbed".
    pub category: Option<String>,
    pub tonnage: Option<TonnageRange>,
    pub axles: Option<u8>,
    pub gooseneck: Option<GooseneckType>,
    pub deck: DeckDimensions,
    pub empty_weight_lbs: Option<u32>,
    pub capacity_lbs: Option<u32>,
    pub description: Option<String>,
    /// Page the product was scraped from. Unique per source.
    pub source_url: String,
    /// Extraction bookkeeping (reconciliation flags, page metadata).
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ManufacturerProduct {
    /// Create a new product with a fresh UUID and empty spec fields.
    pub fn new(source_id: String, name: String, source_url: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_id,
            name,
            series: None,
            model_number: None,
            category: None,
            tonnage: None,
            axles: None,
            gooseneck: None,
            deck: DeckDimensions::default(),
            empty_weight_lbs: None,
            capacity_lbs: None,
            description: None,
            source_url,
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the normalized fields of `self` differ from `other`.
    ///
    /// Identity and timestamps are excluded; used to decide whether a
    /// re-scrape should bump `updated_at`.
    pub fn differs_from(&self, other: &Self) -> bool {
        self.name != other.name
            || self.series != other.series
            || self.model_number != other.model_number
            || self.category != other.category
            || self.tonnage != other.tonnage
            || self.axles != other.axles
            || self.gooseneck != other.gooseneck
            || self.deck != other.deck
            || self.empty_weight_lbs != other.empty_weight_lbs
            || self.capacity_lbs != other.capacity_lbs
            || self.description != other.description
    }
}

/// One raw spec pair from a product page, kept verbatim with its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSpec {
    /// Database row ID (0 before insert).
    pub id: i64,
    pub product_id: String,
    pub category: SpecCategory,
    /// Label as it appeared on the page, e.g. "G.V.W.R.".
    pub key: String,
    pub value: String,
    /// Unit detected in the value text, e.g. "lbs".
    pub unit: Option<String>,
    /// Position within the page, preserving source order.
    pub position: u32,
}

/// An image attached to a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    /// Database row ID (0 before insert).
    pub id: i64,
    pub product_id: String,
    /// Absolute URL the image was discovered at.
    pub url: String,
    /// Content-addressed path under the media directory once downloaded.
    pub stored_path: Option<PathBuf>,
    /// SHA-256 of the downloaded bytes.
    pub content_hash: Option<String>,
    pub position: u32,
}

impl ProductImage {
    /// Create an image record that has not been downloaded yet.
    pub fn new(product_id: String, url: String, position: u32) -> Self {
        Self {
            id: 0,
            product_id,
            url,
            stored_path: None,
            content_hash: None,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tonnage_range_orders_bounds() {
        let r = TonnageRange::new(55, 35);
        assert_eq!(r.min, 35);
        assert_eq!(r.max, 55);
        assert_eq!(r.display(), "35-55");
    }

    #[test]
    fn test_tonnage_range_single() {
        let r = TonnageRange::single(50);
        assert!(r.is_single());
        assert_eq!(r.display(), "50");
    }

    #[test]
    fn test_gooseneck_roundtrip() {
        for g in [
            GooseneckType::Removable,
            GooseneckType::Fixed,
            GooseneckType::Mechanical,
            GooseneckType::Hydraulic,
            GooseneckType::NonGround,
        ] {
            assert_eq!(GooseneckType::parse(g.as_str()), Some(g));
        }
        assert_eq!(GooseneckType::parse("bogus"), None);
    }

    #[test]
    fn test_differs_from_ignores_timestamps() {
        let a = ManufacturerProduct::new(
            "talon".to_string(),
            "50 GSL-3".to_string(),
            "https://example.com/gsl".to_string(),
        );
        let mut b = a.clone();
        b.updated_at = Utc::now();
        assert!(!a.differs_from(&b));

        b.axles = Some(3);
        assert!(a.differs_from(&b));
    }
}
