//! Product image downloads.
//!
//! Images are static assets, not crawl traffic, so a few download in
//! parallel; the shared rate limiter still paces requests per domain.
//! Bytes land in content-addressed storage and the image row records
//! where.

use std::path::PathBuf;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, warn};

use crate::models::ProductImage;
use crate::repository::ProductRepository;
use crate::scrapers::{HttpClient, ScrapeError};
use crate::storage::save_media;

/// Concurrent image downloads.
const IMAGE_CONCURRENCY: usize = 4;

/// Counters from one media run.
#[derive(Debug, Clone, Default)]
pub struct MediaReport {
    pub downloaded: u64,
    pub failed: u64,
}

/// Downloads and stores product images.
pub struct MediaService<'a> {
    client: &'a HttpClient,
    products: &'a ProductRepository,
    media_dir: PathBuf,
}

impl<'a> MediaService<'a> {
    pub fn new(client: &'a HttpClient, products: &'a ProductRepository, media_dir: PathBuf) -> Self {
        Self {
            client,
            products,
            media_dir,
        }
    }

    /// Download every image for a source that has no stored copy yet.
    pub async fn download_pending(
        &self,
        source_id: &str,
        progress: Option<&ProgressBar>,
    ) -> anyhow::Result<MediaReport> {
        let pending = self.products.pending_images(source_id)?;
        if let Some(pb) = progress {
            pb.set_length(pending.len() as u64);
        }

        let mut report = MediaReport::default();
        let fetched: Vec<(ProductImage, Result<Vec<u8>, ScrapeError>)> =
            stream::iter(pending.into_iter())
                .map(|image| async move {
                    let bytes = self.client.fetch_bytes(&image.url).await;
                    (image, bytes)
                })
                .buffer_unordered(IMAGE_CONCURRENCY)
                .collect()
                .await;

        for (image, result) in fetched {
            if let Some(pb) = progress {
                pb.inc(1);
            }
            match result {
                Ok(bytes) => match save_media(&self.media_dir, &bytes, &image.url) {
                    Ok(stored) => {
                        self.products.mark_image_stored(
                            &image.product_id,
                            &image.url,
                            &stored.path,
                            &stored.content_hash,
                        )?;
                        debug!("Stored {} at {}", image.url, stored.path.display());
                        report.downloaded += 1;
                    }
                    Err(e) => {
                        warn!("Failed to store {}: {}", image.url, e);
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    warn!("Failed to download {}: {}", image.url, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
