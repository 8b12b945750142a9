//! Free-text spec value parsers.
//!
//! Manufacturer pages quote the same physical fact a dozen ways: "50 Ton",
//! "55T", "110,000 lbs capacity", "8'6\"", "102 in". These parsers reduce
//! each family of notations to one number, returning `None` for anything
//! they do not recognize rather than guessing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{GooseneckType, TonnageRange};

/// Pounds per ton, for converting quoted capacities.
pub const LBS_PER_TON: u32 = 2000;

static TON_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3})\s*(?:-|–|to)\s*(\d{1,3})\s*(?:tons?\b|t\b)").unwrap()
});
static TON_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3})\s*(?:tons?\b|t\b)").unwrap());
static POUNDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d,]{3,})\s*(?:lbs?\.?\b|pounds?\b|#)").unwrap());
static TONS_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*tons?\b").unwrap());

static AXLE_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2})\s*[- ]?\s*axles?\b").unwrap());
static AXLE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(single|tandem|tri|triple|quad)\s*[- ]?\s*axles?\b").unwrap()
});
static BARE_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d{1,2})\s*$").unwrap());

static FEET_INCHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d{1,3})\s*'\s*(\d{1,2})\s*(?:"|$)"#).unwrap());
static FEET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*(?:'|ft\.?\b|feet\b|foot\b)").unwrap());
static INCHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(\d{1,4}(?:\.\d+)?)\s*(?:"|in\.?\b|inch(?:es)?\b)"#).unwrap());

/// Model designation regex: tonnage, series letters, axle digit, as in
/// "50 GSL-3" or "35DGN-2". Series letters must be capitalized on the
/// page; matching is deliberately not case-insensitive so prose words
/// don't read as model families.
static DESIGNATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{2,3})\s*[- ]?\s*([A-Z]{2,4})\s*-?\s*(\d)\b").unwrap()
});
static SERIES_AXLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,4})\s*-\s*(\d)\b").unwrap());

/// Fields recognized in a product name or model string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelDesignation {
    pub tonnage: Option<u32>,
    pub series: Option<String>,
    pub axles: Option<u8>,
    /// The matched designation text, normalized to "50 GSL-3" form.
    pub designation: Option<String>,
}

/// Parse a rated capacity in tons: "50 Ton", "35-55 ton", "55T",
/// "110,000 lbs capacity".
pub fn parse_tonnage(text: &str) -> Option<TonnageRange> {
    if let Some(caps) = TON_RANGE.captures(text) {
        let min: u32 = caps[1].parse().ok()?;
        let max: u32 = caps[2].parse().ok()?;
        return Some(TonnageRange::new(min, max));
    }
    if let Some(caps) = TON_SINGLE.captures(text) {
        let tons: u32 = caps[1].parse().ok()?;
        return Some(TonnageRange::single(tons));
    }
    if let Some(lbs) = parse_weight_lbs(text) {
        if lbs >= LBS_PER_TON {
            return Some(TonnageRange::single(lbs / LBS_PER_TON));
        }
    }
    None
}

/// Parse an axle count: "3 axle", "tri-axle", "tandem", or a bare "3".
pub fn parse_axles(text: &str) -> Option<u8> {
    if let Some(caps) = AXLE_COUNT.captures(text) {
        let n: u8 = caps[1].parse().ok()?;
        return (1..=9).contains(&n).then_some(n);
    }
    if let Some(caps) = AXLE_WORD.captures(text) {
        return match caps[1].to_lowercase().as_str() {
            "single" => Some(1),
            "tandem" => Some(2),
            "tri" | "triple" => Some(3),
            "quad" => Some(4),
            _ => None,
        };
    }
    if let Some(caps) = BARE_COUNT.captures(text) {
        let n: u8 = caps[1].parse().ok()?;
        return (1..=9).contains(&n).then_some(n);
    }
    None
}

/// Parse a gooseneck style from free text.
///
/// The detachable variants are checked before the generic removable
/// keywords so "hydraulic detachable gooseneck" lands on `Hydraulic`.
pub fn parse_gooseneck(text: &str) -> Option<GooseneckType> {
    let lower = text.to_lowercase();
    if lower.contains("non-ground") || lower.contains("non ground") {
        return Some(GooseneckType::NonGround);
    }
    if lower.contains("hydraulic") {
        return Some(GooseneckType::Hydraulic);
    }
    if lower.contains("mechanical") {
        return Some(GooseneckType::Mechanical);
    }
    if lower.contains("rgn") || lower.contains("removable") || lower.contains("detachable") {
        return Some(GooseneckType::Removable);
    }
    if lower.contains("fixed") {
        return Some(GooseneckType::Fixed);
    }
    None
}

/// Parse a length to inches: `8'6"`, `53'`, `26 ft`, `102"`, `610 in`.
///
/// A bare number without a unit is not a dimension.
pub fn parse_dimension_inches(text: &str) -> Option<f64> {
    if let Some(caps) = FEET_INCHES.captures(text) {
        let feet: f64 = caps[1].parse().ok()?;
        let inches: f64 = caps[2].parse().ok()?;
        return Some(feet * 12.0 + inches);
    }
    if let Some(caps) = FEET.captures(text) {
        let feet: f64 = caps[1].parse().ok()?;
        return Some(feet * 12.0);
    }
    if let Some(caps) = INCHES.captures(text) {
        return caps[1].parse().ok();
    }
    None
}

/// Parse a weight to pounds: "12,500 lbs", "10000#", "6.5 tons".
pub fn parse_weight_lbs(text: &str) -> Option<u32> {
    if let Some(caps) = POUNDS.captures(text) {
        let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
        return digits.parse().ok();
    }
    if let Some(caps) = TONS_DECIMAL.captures(text) {
        let tons: f64 = caps[1].parse().ok()?;
        return Some((tons * LBS_PER_TON as f64).round() as u32);
    }
    None
}

/// Extract tonnage, series, and axle count from a model designation.
///
/// "50 GSL-3" yields tonnage 50, series "GSL", axles 3. Tolerates
/// missing separators ("35DGN-2") and brand noise around the
/// designation. Tonnage outside the plausible 5-150 band (model years,
/// part numbers) is rejected.
pub fn parse_model_designation(name: &str) -> ModelDesignation {
    if let Some(caps) = DESIGNATION.captures(name) {
        let tonnage: Option<u32> = caps[1].parse().ok().filter(|t| (5..=150).contains(t));
        let axles: Option<u8> = caps[3].parse().ok().filter(|a| (1..=6).contains(a));
        if tonnage.is_some() {
            let series = caps[2].to_string();
            let designation = match axles {
                Some(a) => format!("{} {}-{}", &caps[1], series, a),
                None => format!("{} {}", &caps[1], series),
            };
            return ModelDesignation {
                tonnage,
                series: Some(series),
                axles,
                designation: Some(designation),
            };
        }
    }

    // Series and axle digit without a leading tonnage: "GSL-3".
    if let Some(caps) = SERIES_AXLES.captures(name) {
        let axles: Option<u8> = caps[2].parse().ok().filter(|a| (1..=6).contains(a));
        if axles.is_some() {
            let series = caps[1].to_string();
            return ModelDesignation {
                tonnage: parse_tonnage(name).map(|t| t.min),
                series: Some(series.clone()),
                axles,
                designation: Some(format!("{}-{}", series, axles.unwrap())),
            };
        }
    }

    ModelDesignation {
        tonnage: parse_tonnage(name).map(|t| t.min),
        ..Default::default()
    }
}

static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([\d,]+)(?:\.(\d{2}))?").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

/// Parse a dollar amount to cents: "$125,000", "$ 89,500.00".
pub fn parse_price_cents(text: &str) -> Option<i64> {
    let caps = PRICE.captures(text)?;
    let dollars: i64 = caps[1]
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .ok()?;
    let cents: i64 = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some(dollars * 100 + cents)
}

/// Parse a model year from free text, e.g. "2022 55 Ton Lowboy".
pub fn parse_year(text: &str) -> Option<u16> {
    YEAR.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// Detect the unit mentioned in a spec value, for the spec row's unit
/// column.
pub fn detect_unit(value: &str) -> Option<String> {
    static UNIT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
        vec![
            (Regex::new(r"(?i)\d\s*(?:lbs?\.?\b|pounds?\b|#)").unwrap(), "lbs"),
            (Regex::new(r"(?i)\d\s*tons?\b").unwrap(), "ton"),
            (Regex::new(r#"(?i)\d\s*(?:"|in\.?\b|inch(?:es)?\b)"#).unwrap(), "in"),
            (Regex::new(r"(?i)\d\s*(?:'|ft\.?\b|feet\b|foot\b)").unwrap(), "ft"),
            (Regex::new(r"(?i)\d\s*psi\b").unwrap(), "psi"),
            (Regex::new(r"(?i)\d\s*volts?\b").unwrap(), "volt"),
        ]
    });
    UNIT_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(value))
        .map(|(_, unit)| unit.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tonnage_single() {
        assert_eq!(parse_tonnage("50 Ton"), Some(TonnageRange::single(50)));
        assert_eq!(parse_tonnage("55T"), Some(TonnageRange::single(55)));
        assert_eq!(parse_tonnage("no capacity here"), None);
    }

    #[test]
    fn test_parse_tonnage_range() {
        assert_eq!(parse_tonnage("35-55 ton"), Some(TonnageRange::new(35, 55)));
        assert_eq!(
            parse_tonnage("35 to 55 Tons"),
            Some(TonnageRange::new(35, 55))
        );
    }

    #[test]
    fn test_parse_tonnage_from_pounds() {
        assert_eq!(
            parse_tonnage("110,000 lbs capacity"),
            Some(TonnageRange::single(55))
        );
    }

    #[test]
    fn test_parse_axles() {
        assert_eq!(parse_axles("3 axle"), Some(3));
        assert_eq!(parse_axles("3-Axle"), Some(3));
        assert_eq!(parse_axles("tri-axle"), Some(3));
        assert_eq!(parse_axles("Tandem Axle"), Some(2));
        assert_eq!(parse_axles("3"), Some(3));
        assert_eq!(parse_axles("air ride"), None);
    }

    #[test]
    fn test_parse_gooseneck() {
        assert_eq!(
            parse_gooseneck("Hydraulic Detachable Gooseneck"),
            Some(GooseneckType::Hydraulic)
        );
        assert_eq!(
            parse_gooseneck("Mechanical RGN"),
            Some(GooseneckType::Mechanical)
        );
        assert_eq!(parse_gooseneck("RGN"), Some(GooseneckType::Removable));
        assert_eq!(
            parse_gooseneck("Non-Ground Bearing"),
            Some(GooseneckType::NonGround)
        );
        assert_eq!(parse_gooseneck("Fixed neck"), Some(GooseneckType::Fixed));
        assert_eq!(parse_gooseneck("air ride"), None);
    }

    #[test]
    fn test_parse_dimension_inches() {
        assert_eq!(parse_dimension_inches("8'6\""), Some(102.0));
        assert_eq!(parse_dimension_inches("53'"), Some(636.0));
        assert_eq!(parse_dimension_inches("26 ft"), Some(312.0));
        assert_eq!(parse_dimension_inches("102\""), Some(102.0));
        assert_eq!(parse_dimension_inches("610 in"), Some(610.0));
        assert_eq!(parse_dimension_inches("102"), None);
    }

    #[test]
    fn test_parse_weight_lbs() {
        assert_eq!(parse_weight_lbs("12,500 lbs"), Some(12_500));
        assert_eq!(parse_weight_lbs("10000#"), Some(10_000));
        assert_eq!(parse_weight_lbs("6.5 tons"), Some(13_000));
        assert_eq!(parse_weight_lbs("heavy"), None);
    }

    #[test]
    fn test_parse_model_designation() {
        let d = parse_model_designation("50 GSL-3");
        assert_eq!(d.tonnage, Some(50));
        assert_eq!(d.series.as_deref(), Some("GSL"));
        assert_eq!(d.axles, Some(3));
        assert_eq!(d.designation.as_deref(), Some("50 GSL-3"));
    }

    #[test]
    fn test_parse_model_designation_no_separators() {
        let d = parse_model_designation("Talon 35DGN-2 Lowboy");
        assert_eq!(d.tonnage, Some(35));
        assert_eq!(d.series.as_deref(), Some("DGN"));
        assert_eq!(d.axles, Some(2));
    }

    #[test]
    fn test_parse_model_designation_rejects_years() {
        let d = parse_model_designation("2024 Inventory");
        assert_eq!(d.series, None);
        assert_eq!(d.tonnage, None);
    }

    #[test]
    fn test_parse_model_designation_series_only() {
        let d = parse_model_designation("GSL-3 Series Lowboy, 50 Ton");
        assert_eq!(d.series.as_deref(), Some("GSL"));
        assert_eq!(d.axles, Some(3));
        assert_eq!(d.tonnage, Some(50));
    }

    #[test]
    fn test_parse_price_cents() {
        assert_eq!(parse_price_cents("$125,000"), Some(12_500_000));
        assert_eq!(parse_price_cents("Price: $ 89,500.50"), Some(8_950_050));
        assert_eq!(parse_price_cents("Call for price"), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2022 55 Ton Lowboy"), Some(2022));
        assert_eq!(parse_year("55 Ton Lowboy"), None);
    }

    #[test]
    fn test_detect_unit() {
        assert_eq!(detect_unit("12,500 lbs").as_deref(), Some("lbs"));
        assert_eq!(detect_unit("102\"").as_deref(), Some("in"));
        assert_eq!(detect_unit("26 ft").as_deref(), Some("ft"));
        assert_eq!(detect_unit("Apitong wood"), None);
    }
}
