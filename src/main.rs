//! Axles - commercial truck and trailer marketplace data acquisition.
//!
//! Command-line entry point. Scrapes manufacturer and dealer sites,
//! normalizes product specifications, and seeds the marketplace database.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if axles::cli::is_verbose() {
        "axles=info"
    } else {
        "axles=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    axles::cli::run().await
}
