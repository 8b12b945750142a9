//! Scrape source models.
//!
//! A source is one site the acquisition pipeline knows how to visit:
//! a manufacturer's product catalog or a dealer's inventory pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of site a source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Manufacturer catalog pages (spec sheets per model).
    Manufacturer,
    /// Dealer inventory pages (priced units for sale).
    Dealer,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufacturer => "manufacturer",
            Self::Dealer => "dealer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manufacturer" => Some(Self::Manufacturer),
            "dealer" => Some(Self::Dealer),
            _ => None,
        }
    }
}

/// A configured scrape source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Short identifier, e.g. "talon" or "midwest-trailer".
    pub id: String,
    pub kind: SourceKind,
    /// Human-readable site name.
    pub name: String,
    pub base_url: String,
    /// Free-form site metadata (brand names, notes).
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// When a scrape run last completed for this source.
    pub last_scraped: Option<DateTime<Utc>>,
}

impl Source {
    /// Create a new source with empty metadata.
    pub fn new(id: String, kind: SourceKind, name: String, base_url: String) -> Self {
        Self {
            id,
            kind,
            name,
            base_url,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            last_scraped: None,
        }
    }
}
