//! Product and listing export.
//!
//! JSON carries the full records including spec rows; CSV flattens the
//! normalized headline fields into fixed columns for spreadsheet use.

use std::io::Write;

use serde::Serialize;

use crate::models::{Listing, ManufacturerProduct, ProductSpec};
use crate::repository::{ListingFilter, ListingRepository, ProductRepository};

/// Output format for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Serialize)]
struct ProductExportRow<'a> {
    #[serde(flatten)]
    product: &'a ManufacturerProduct,
    specs: &'a [ProductSpec],
}

/// Quote a CSV field when it needs it.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Export all products to a writer.
pub fn export_products(
    repo: &ProductRepository,
    format: ExportFormat,
    out: &mut dyn Write,
) -> anyhow::Result<u64> {
    let products = repo.list_all()?;
    let count = products.len() as u64;

    match format {
        ExportFormat::Json => {
            let mut rows = Vec::with_capacity(products.len());
            let specs: Vec<Vec<ProductSpec>> = products
                .iter()
                .map(|p| repo.get_specs(&p.id))
                .collect::<Result<_, _>>()?;
            for (product, specs) in products.iter().zip(specs.iter()) {
                rows.push(ProductExportRow {
                    product,
                    specs: specs.as_slice(),
                });
            }
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)?;
        }
        ExportFormat::Csv => {
            writeln!(
                out,
                "id,source_id,name,series,model_number,category,tonnage_min,tonnage_max,\
                 axles,gooseneck,deck_length_in,deck_width_in,deck_height_in,\
                 empty_weight_lbs,capacity_lbs,source_url"
            )?;
            for p in &products {
                let fields = vec![
                    p.id.clone(),
                    p.source_id.clone(),
                    p.name.clone(),
                    opt(&p.series),
                    opt(&p.model_number),
                    opt(&p.category),
                    opt(&p.tonnage.map(|t| t.min)),
                    opt(&p.tonnage.map(|t| t.max)),
                    opt(&p.axles),
                    opt(&p.gooseneck.map(|g| g.as_str().to_string())),
                    opt(&p.deck.length_in),
                    opt(&p.deck.width_in),
                    opt(&p.deck.height_in),
                    opt(&p.empty_weight_lbs),
                    opt(&p.capacity_lbs),
                    p.source_url.clone(),
                ];
                writeln!(out, "{}", csv_row(&fields))?;
            }
        }
    }
    Ok(count)
}

/// Export listings matching a filter to a writer.
pub fn export_listings(
    repo: &ListingRepository,
    filter: &ListingFilter,
    format: ExportFormat,
    out: &mut dyn Write,
) -> anyhow::Result<u64> {
    let listings: Vec<Listing> = repo.list(filter)?;
    let count = listings.len() as u64;

    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &listings)?;
            writeln!(out)?;
        }
        ExportFormat::Csv => {
            writeln!(
                out,
                "id,profile_id,title,price_cents,year,make,model,condition,\
                 city,state,category,status,source_url"
            )?;
            for l in &listings {
                let fields = vec![
                    l.id.clone(),
                    l.profile_id.clone(),
                    l.title.clone(),
                    opt(&l.price_cents),
                    opt(&l.year),
                    opt(&l.make),
                    opt(&l.model),
                    opt(&l.condition.map(|c| c.as_str().to_string())),
                    opt(&l.city),
                    opt(&l.state),
                    opt(&l.category),
                    l.status.as_str().to_string(),
                    opt(&l.source_url),
                ];
                writeln!(out, "{}", csv_row(&fields))?;
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_csv_row() {
        let row = csv_row(&["a".to_string(), "b,c".to_string(), String::new()]);
        assert_eq!(row, "a,\"b,c\",");
    }
}
