//! HTML extraction for product pages.
//!
//! Pulls the generic shapes manufacturer spec sheets reduce to: spec
//! tables (th/td or first-two-td rows), definition lists, and
//! colon-separated list items, plus the name, description, and image
//! URLs. Everything is synchronous; callers fetch first and hand the
//! body in as text.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use super::config::ExtractConfig;
use crate::utils::html::collapse_whitespace;

/// Raw fields extracted from one product page.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Key/value spec pairs in page order.
    pub raw_specs: Vec<(String, String)>,
    /// Absolute image URLs in page order, deduplicated.
    pub image_urls: Vec<String>,
}

/// Parse a configured selector, warning once per bad pattern.
fn parse_selector(pattern: &str) -> Option<Selector> {
    match Selector::parse(pattern) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Ignoring invalid selector {:?}: {}", pattern, e);
            None
        }
    }
}

/// Element text with whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Resolve an href against the page URL. Absolute URLs pass through.
pub fn resolve_url(page_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let resolved = base.join(href.trim()).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Extract spec pairs from table rows: th/td pairs, or the first two
/// cells of td-only rows. Rows without both halves are skipped.
fn extract_table_specs(document: &Html, selector: &Selector, specs: &mut Vec<(String, String)>) {
    let row_sel = Selector::parse("tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    for table in document.select(selector) {
        for row in table.select(&row_sel) {
            let header = row.select(&th_sel).next().map(element_text);
            let mut cells = row.select(&td_sel);

            let (key, value) = match header {
                Some(key) => (key, cells.next().map(element_text)),
                None => (
                    cells.next().map(element_text).unwrap_or_default(),
                    cells.next().map(element_text),
                ),
            };

            if let Some(value) = value {
                let key = key.trim_end_matches(':').trim().to_string();
                let value = value.trim().to_string();
                if !key.is_empty() && !value.is_empty() {
                    specs.push((key, value));
                }
            }
        }
    }
}

/// Extract spec pairs from definition lists (dt/dd).
fn extract_dl_specs(document: &Html, specs: &mut Vec<(String, String)>) {
    let dl_sel = Selector::parse("dl").unwrap();
    let dt_sel = Selector::parse("dt").unwrap();
    let dd_sel = Selector::parse("dd").unwrap();

    for dl in document.select(&dl_sel) {
        let keys: Vec<String> = dl.select(&dt_sel).map(element_text).collect();
        let values: Vec<String> = dl.select(&dd_sel).map(element_text).collect();
        for (key, value) in keys.into_iter().zip(values) {
            let key = key.trim_end_matches(':').trim().to_string();
            if !key.is_empty() && !value.is_empty() {
                specs.push((key, value));
            }
        }
    }
}

/// Extract spec pairs from colon-separated list items:
/// `<li>Capacity: 55 Ton</li>`.
fn extract_list_specs(document: &Html, selector: &Selector, specs: &mut Vec<(String, String)>) {
    for item in document.select(selector) {
        let text = element_text(item);
        if let Some((key, value)) = text.split_once(':') {
            let key = key.trim().to_string();
            let value = value.trim().to_string();
            if !key.is_empty() && !value.is_empty() {
                specs.push((key, value));
            }
        }
    }
}

/// Content of a meta tag by property or name.
fn meta_content(document: &Html, attr: &str, value: &str) -> Option<String> {
    let sel = parse_selector(&format!(r#"meta[{}="{}"]"#, attr, value))?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

/// Extract all product fields from a page.
pub fn extract_product(html: &str, page_url: &str, config: &ExtractConfig) -> ExtractedPage {
    let document = Html::parse_document(html);
    let mut page = ExtractedPage::default();

    // Name: configured selector, then og:title, then h1.
    if let Some(sel) = config.name_selector.as_deref().and_then(parse_selector) {
        page.name = document
            .select(&sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());
    }
    if page.name.is_none() {
        page.name = meta_content(&document, "property", "og:title");
    }
    if page.name.is_none() {
        let h1 = Selector::parse("h1").unwrap();
        page.name = document
            .select(&h1)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());
    }

    // Description: configured selector, then meta description.
    if let Some(sel) = config
        .description_selector
        .as_deref()
        .and_then(parse_selector)
    {
        page.description = document
            .select(&sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());
    }
    if page.description.is_none() {
        page.description = meta_content(&document, "name", "description");
    }

    // Spec pairs: tables, definition lists, then list items.
    let table_sel = config
        .spec_table_selector
        .as_deref()
        .and_then(parse_selector)
        .or_else(|| Selector::parse("table").ok());
    if let Some(sel) = table_sel {
        extract_table_specs(&document, &sel, &mut page.raw_specs);
    }
    extract_dl_specs(&document, &mut page.raw_specs);
    if let Some(sel) = config.spec_list_selector.as_deref().and_then(parse_selector) {
        extract_list_specs(&document, &sel, &mut page.raw_specs);
    }

    // Images: configured selector or every img, with og:image first.
    let mut seen = HashSet::new();
    if let Some(og_image) = meta_content(&document, "property", "og:image") {
        if let Some(url) = resolve_url(page_url, &og_image) {
            if seen.insert(url.clone()) {
                page.image_urls.push(url);
            }
        }
    }
    let image_sel = config
        .image_selector
        .as_deref()
        .and_then(parse_selector)
        .or_else(|| Selector::parse("img").ok());
    if let Some(sel) = image_sel {
        for img in document.select(&sel) {
            let src = img
                .value()
                .attr(&config.image_attr)
                .or_else(|| img.value().attr("src"));
            let Some(src) = src else { continue };
            if src.starts_with("data:") {
                continue;
            }
            if let Some(url) = resolve_url(page_url, src) {
                if seen.insert(url.clone()) {
                    page.image_urls.push(url);
                }
            }
        }
    }

    page
}

/// Extract absolute link targets matched by a selector.
pub fn extract_links(html: &str, page_url: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(selector) {
        let href = anchor
            .value()
            .attr("href")
            .or_else(|| anchor.value().attr("data-href"));
        let Some(href) = href else { continue };
        if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
            continue;
        }
        if let Some(url) = resolve_url(page_url, href) {
            // Drop fragments so the same page isn't visited per anchor.
            let url = url.split('#').next().unwrap_or(&url).to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_PAGE: &str = r##"
        <html>
        <head>
            <title>Talon Trailers</title>
            <meta property="og:title" content="50 GSL-3 Lowboy">
            <meta name="description" content="Severe duty hydraulic gooseneck lowboy.">
            <meta property="og:image" content="/img/gsl-hero.jpg">
        </head>
        <body>
            <h1>50 GSL-3</h1>
            <table class="specs">
                <tr><th>Capacity</th><td>50 Ton</td></tr>
                <tr><th>Axles:</th><td>3</td></tr>
                <tr><td>Deck Height</td><td>18"</td></tr>
                <tr><td>incomplete row</td></tr>
            </table>
            <dl>
                <dt>Suspension</dt><dd>Air ride</dd>
            </dl>
            <ul class="quick-specs">
                <li>Empty Weight: 24,500 lbs</li>
                <li>No separator here</li>
            </ul>
            <img src="/img/gsl-side.jpg">
            <img src="/img/gsl-side.jpg">
            <img src="data:image/gif;base64,xyz">
            <a class="model" href="/models/55-hrg-3">55 HRG-3</a>
            <a class="model" href="#specs">jump</a>
        </body>
        </html>
    "##;

    fn config_with_list() -> ExtractConfig {
        ExtractConfig {
            spec_list_selector: Some("ul.quick-specs li".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_product_specs() {
        let page = extract_product(
            PRODUCT_PAGE,
            "https://talon.example/models/50-gsl-3",
            &config_with_list(),
        );
        assert_eq!(
            page.raw_specs,
            vec![
                ("Capacity".to_string(), "50 Ton".to_string()),
                ("Axles".to_string(), "3".to_string()),
                ("Deck Height".to_string(), "18\"".to_string()),
                ("Suspension".to_string(), "Air ride".to_string()),
                ("Empty Weight".to_string(), "24,500 lbs".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_product_name_prefers_selector_then_meta() {
        let config = ExtractConfig {
            name_selector: Some("h1".to_string()),
            ..Default::default()
        };
        let page = extract_product(PRODUCT_PAGE, "https://talon.example/x", &config);
        assert_eq!(page.name.as_deref(), Some("50 GSL-3"));

        let page = extract_product(PRODUCT_PAGE, "https://talon.example/x", &Default::default());
        assert_eq!(page.name.as_deref(), Some("50 GSL-3 Lowboy"));
    }

    #[test]
    fn test_extract_product_images_absolute_and_deduped() {
        let page = extract_product(
            PRODUCT_PAGE,
            "https://talon.example/models/50-gsl-3",
            &Default::default(),
        );
        assert_eq!(
            page.image_urls,
            vec![
                "https://talon.example/img/gsl-hero.jpg".to_string(),
                "https://talon.example/img/gsl-side.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_links() {
        let sel = Selector::parse("a.model").unwrap();
        let links = extract_links(PRODUCT_PAGE, "https://talon.example/models/", &sel);
        assert_eq!(links, vec!["https://talon.example/models/55-hrg-3"]);
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://a.example/x/", "b.html"),
            Some("https://a.example/x/b.html".to_string())
        );
        assert_eq!(
            resolve_url("https://a.example/x/", "https://b.example/y"),
            Some("https://b.example/y".to_string())
        );
        assert_eq!(resolve_url("https://a.example/", "mailto:x@y.z"), None);
    }
}
