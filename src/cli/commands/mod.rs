//! CLI parser and command dispatch.

mod export;
mod helpers;
mod init;
mod listings;
mod products;
mod scrape;
mod seed;
mod source;
mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{Config, Settings};
use crate::models::SourceKind;

#[derive(Parser)]
#[command(name = "axles")]
#[command(about = "Commercial truck and trailer marketplace data acquisition")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the database, media, and limiter state
    #[arg(long, global = true, env = "AXLES_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Source kind for `source add`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[default]
    Manufacturer,
    Dealer,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Manufacturer => SourceKind::Manufacturer,
            KindArg::Dealer => SourceKind::Dealer,
        }
    }
}

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and register configured sources
    Init,

    /// Manage scrape sources
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Discover product URLs for a source (does not scrape them)
    Discover {
        /// Source ID to discover
        source_id: String,
    },

    /// Run the scrape pipeline: discover, fetch, normalize, upsert
    Scrape {
        /// Source ID to scrape (omit with --all)
        source_id: Option<String>,

        /// Scrape every configured source sequentially
        #[arg(long)]
        all: bool,

        /// Cap on product pages fetched this run
        #[arg(long)]
        limit: Option<u32>,

        /// Re-check already-fetched URLs with conditional requests
        #[arg(long)]
        refresh: bool,

        /// Normalize without writing to the database
        #[arg(long)]
        dry_run: bool,

        /// Skip downloading product images
        #[arg(long)]
        no_images: bool,
    },

    /// Inspect normalized products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Inspect marketplace listings
    Listings {
        /// Filter by status (draft, active, sold, removed)
        #[arg(long)]
        status: Option<String>,

        /// Filter by category slug
        #[arg(long)]
        category: Option<String>,

        /// Max rows to show
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Inspect and capture leads
    Leads {
        #[command(subcommand)]
        command: LeadCommands,
    },

    /// Manage dealer profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Seed draft listings from a source's products
    Seed {
        /// Source whose products to seed from
        source_id: String,

        /// Dealer profile that will own the listings
        #[arg(long)]
        profile: String,
    },

    /// Export products or listings as JSON or CSV
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },

    /// Per-source crawl, product, and listing counts
    Stats,
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List known sources
    List,
    /// Add a source by hand (configured sites are added by `init`)
    Add {
        /// Short source ID, e.g. "talon"
        id: String,
        /// Site base URL
        base_url: String,
        /// Human-readable name
        #[arg(long)]
        name: Option<String>,
        /// Site kind
        #[arg(long, value_enum, default_value = "manufacturer")]
        kind: KindArg,
    },
    /// Remove a source
    Remove { id: String },
    /// Show one source with its crawl state
    Show { id: String },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List products, optionally for one source
    List {
        #[arg(long)]
        source: Option<String>,
    },
    /// Show one product with its specs and images
    Show { id: String },
    /// Search products by name, series, or model number
    Search { term: String },
}

#[derive(Subcommand)]
enum LeadCommands {
    /// List captured leads
    List {
        /// Only leads routed to this profile
        #[arg(long)]
        profile: Option<String>,
    },
    /// Capture a lead
    Add {
        name: String,
        phone: String,
        /// What the caller was interested in
        #[arg(long)]
        message: String,
        #[arg(long)]
        email: Option<String>,
        /// Listing the inquiry is about; routes the lead to its dealer
        #[arg(long)]
        listing: Option<String>,
        /// Capture channel
        #[arg(long, default_value = "cli")]
        source: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List dealer profiles
    List,
    /// Add a dealer profile
    Add {
        company_name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export manufacturer products
    Products {
        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export marketplace listings
    Listings {
        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.data_dir, cli.config);
    let config = Config::load(&settings)?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::Source { command } => match command {
            SourceCommands::List => source::cmd_list(&settings),
            SourceCommands::Add {
                id,
                base_url,
                name,
                kind,
            } => source::cmd_add(&settings, &id, &base_url, name, kind.into()),
            SourceCommands::Remove { id } => source::cmd_remove(&settings, &id),
            SourceCommands::Show { id } => source::cmd_show(&settings, &id),
        },
        Commands::Discover { source_id } => {
            scrape::cmd_discover(&settings, &config, &source_id).await
        }
        Commands::Scrape {
            source_id,
            all,
            limit,
            refresh,
            dry_run,
            no_images,
        } => {
            let options = scrape::ScrapeArgs {
                limit,
                refresh,
                dry_run,
                no_images,
            };
            scrape::cmd_scrape(&settings, &config, source_id.as_deref(), all, &options).await
        }
        Commands::Products { command } => match command {
            ProductCommands::List { source } => {
                products::cmd_list(&settings, source.as_deref())
            }
            ProductCommands::Show { id } => products::cmd_show(&settings, &id),
            ProductCommands::Search { term } => products::cmd_search(&settings, &term),
        },
        Commands::Listings {
            status,
            category,
            limit,
        } => listings::cmd_listings(&settings, status.as_deref(), category, limit),
        Commands::Leads { command } => match command {
            LeadCommands::List { profile } => {
                listings::cmd_leads(&settings, profile.as_deref())
            }
            LeadCommands::Add {
                name,
                phone,
                message,
                email,
                listing,
                source,
            } => listings::cmd_lead_add(
                &settings,
                name,
                phone,
                message,
                email,
                listing.as_deref(),
                source,
            ),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::List => listings::cmd_profile_list(&settings),
            ProfileCommands::Add {
                company_name,
                phone,
                email,
                city,
                state,
            } => listings::cmd_profile_add(&settings, company_name, phone, email, city, state),
        },
        Commands::Seed { source_id, profile } => {
            seed::cmd_seed(&settings, &source_id, &profile)
        }
        Commands::Export { command } => match command {
            ExportCommands::Products { format, output } => {
                export::cmd_export_products(&settings, format, output.as_deref())
            }
            ExportCommands::Listings { format, output } => {
                export::cmd_export_listings(&settings, format, output.as_deref())
            }
        },
        Commands::Stats => stats::cmd_stats(&settings),
    }
}
