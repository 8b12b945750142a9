//! Marketplace listing models.
//!
//! Listings are the rows the marketplace front end reads. The pipeline
//! writes them two ways: dealer scrapes upsert priced units directly, and
//! `seed` turns normalized manufacturer products into draft listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Active,
    Sold,
    Removed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Sold => "sold",
            Self::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "sold" => Some(Self::Sold),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }
}

/// Unit condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    Used,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "used" => Some(Self::Used),
            _ => None,
        }
    }
}

/// A marketplace listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// UUID, assigned on first insert.
    pub id: String,
    /// Owning dealer profile.
    pub profile_id: String,
    /// Unique per profile; the upsert key for scraped inventory.
    pub title: String,
    pub description: Option<String>,
    /// Asking price in cents; `None` means "call for price".
    pub price_cents: Option<i64>,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub condition: Option<Condition>,
    pub mileage: Option<u32>,
    /// Engine hours, for powered equipment.
    pub hours: Option<u32>,
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Category slug, e.g. "lowboy" or "dump-truck".
    pub category: Option<String>,
    pub status: ListingStatus,
    /// Page the listing was scraped from, when dealer-sourced.
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a draft listing owned by `profile_id`.
    pub fn new(profile_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            profile_id,
            title,
            description: None,
            price_cents: None,
            year: None,
            make: None,
            model: None,
            condition: None,
            mileage: None,
            hours: None,
            vin: None,
            stock_number: None,
            city: None,
            state: None,
            category: None,
            status: ListingStatus::Draft,
            source_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An image attached to a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingImage {
    /// Database row ID (0 before insert).
    pub id: i64,
    pub listing_id: String,
    pub url: String,
    pub position: u32,
}

/// A dealer profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// UUID, assigned on first insert.
    pub id: String,
    pub company_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(company_name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            company_name,
            phone: None,
            email: None,
            website: None,
            city: None,
            state: None,
            created_at: Utc::now(),
        }
    }
}

/// Follow-up status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Closed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// A buyer inquiry captured against a listing or dealer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// UUID, assigned on first insert.
    pub id: String,
    pub listing_id: Option<String>,
    /// Dealer the lead routes to (derived from the listing when present).
    pub profile_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    /// What the caller was interested in, in their words.
    pub message: String,
    /// Capture channel, e.g. "phone_call" or "web_form".
    pub source: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(name: String, phone: String, message: String, source: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            listing_id: None,
            profile_id: None,
            name,
            phone,
            email: None,
            message,
            source,
            status: LeadStatus::New,
            created_at: Utc::now(),
        }
    }
}
