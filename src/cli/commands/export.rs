//! Export commands.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use console::style;

use super::FormatArg;
use crate::config::Settings;
use crate::repository::{ListingFilter, ListingRepository, ProductRepository};
use crate::services::{export_listings, export_products, ExportFormat};

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

fn open_output(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match output {
        Some(path) => Ok(Box::new(File::create(path)?)),
        None => Ok(Box::new(std::io::stdout())),
    }
}

/// Export manufacturer products.
pub fn cmd_export_products(
    settings: &Settings,
    format: FormatArg,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let repo = ProductRepository::new(&settings.database_path())?;
    let mut out = open_output(output)?;
    let count = export_products(&repo, format.into(), &mut out)?;
    if let Some(path) = output {
        println!(
            "{} Exported {} products to {}",
            style("✓").green(),
            count,
            path.display()
        );
    }
    Ok(())
}

/// Export marketplace listings.
pub fn cmd_export_listings(
    settings: &Settings,
    format: FormatArg,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let repo = ListingRepository::new(&settings.database_path())?;
    let mut out = open_output(output)?;
    let count = export_listings(&repo, &ListingFilter::default(), format.into(), &mut out)?;
    if let Some(path) = output {
        println!(
            "{} Exported {} listings to {}",
            style("✓").green(),
            count,
            path.display()
        );
    }
    Ok(())
}
