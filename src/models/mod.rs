//! Data models for Axles.

mod crawl;
mod listing;
mod product;
mod source;

pub use crawl::{CrawlUrl, DiscoveryMethod, RequestLog, UrlStatus};
pub use listing::{Condition, Lead, LeadStatus, Listing, ListingImage, ListingStatus, Profile};
pub use product::{
    DeckDimensions, GooseneckType, ManufacturerProduct, ProductImage, ProductSpec, SpecCategory,
    TonnageRange,
};
pub use source::{Source, SourceKind};
