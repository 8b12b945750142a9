//! URL discovery sources.

mod sitemap;

pub use sitemap::SitemapDiscovery;
