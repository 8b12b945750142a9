//! Pipeline orchestration services.

mod export;
mod ingest;
mod media;
mod seed;

pub use export::{export_listings, export_products, ExportFormat};
pub use ingest::{IngestOptions, IngestReport, IngestService};
pub use media::{MediaReport, MediaService};
pub use seed::{listing_title, SeedReport, SeedService};
