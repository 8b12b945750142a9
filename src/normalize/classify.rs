//! Raw spec key classification.
//!
//! Maps the free-text labels manufacturer pages use ("G.V.W.R.",
//! "Deck Height", "Gooseneck Style") onto semantic categories. Patterns
//! are tried in order and the first match wins, so more specific
//! categories sit above the generic dimension bucket.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::SpecCategory;

static KEY_PATTERNS: LazyLock<Vec<(Regex, SpecCategory)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)gooseneck|neck\s*(?:style|type|length)|king\s*pin|kingpin|coupler")
                .unwrap(),
            SpecCategory::Gooseneck,
        ),
        (
            Regex::new(r"(?i)\baxles?\b").unwrap(),
            SpecCategory::Axles,
        ),
        (
            Regex::new(r"(?i)capacity|rating|rated|payload|tonnage|g\.?v\.?w\.?r?\.?\b").unwrap(),
            SpecCategory::Capacity,
        ),
        (
            Regex::new(r"(?i)deck|\bwell\b|platform|loaded\s*height|ground\s*clearance").unwrap(),
            SpecCategory::Deck,
        ),
        (
            Regex::new(r"(?i)weight|\btare\b").unwrap(),
            SpecCategory::Weight,
        ),
        (
            Regex::new(r"(?i)suspension|\bride\b|springs?\b").unwrap(),
            SpecCategory::Suspension,
        ),
        (
            Regex::new(r"(?i)tires?|wheels?|\brims?\b|brakes?").unwrap(),
            SpecCategory::Tires,
        ),
        (
            Regex::new(r"(?i)electrical|lights?|wiring|harness|volt").unwrap(),
            SpecCategory::Electrical,
        ),
        (
            Regex::new(r"(?i)length|width|height|overall|swing|clearance|dimension").unwrap(),
            SpecCategory::Dimensions,
        ),
    ]
});

/// Classify a raw spec key into its semantic category.
///
/// Stateless: a key always maps to the same category regardless of what
/// else the page contained.
pub fn classify_key(key: &str) -> SpecCategory {
    KEY_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(key))
        .map(|(_, cat)| *cat)
        .unwrap_or(SpecCategory::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_capacity_keys() {
        assert_eq!(classify_key("Capacity"), SpecCategory::Capacity);
        assert_eq!(classify_key("G.V.W.R."), SpecCategory::Capacity);
        assert_eq!(classify_key("GVWR"), SpecCategory::Capacity);
        assert_eq!(classify_key("Rated Payload"), SpecCategory::Capacity);
    }

    #[test]
    fn test_classify_deck_before_dimensions() {
        assert_eq!(classify_key("Deck Height"), SpecCategory::Deck);
        assert_eq!(classify_key("Deck Length"), SpecCategory::Deck);
        assert_eq!(classify_key("Overall Length"), SpecCategory::Dimensions);
    }

    #[test]
    fn test_classify_gooseneck_before_deck() {
        assert_eq!(classify_key("Gooseneck Length"), SpecCategory::Gooseneck);
        assert_eq!(classify_key("Gooseneck Style"), SpecCategory::Gooseneck);
        assert_eq!(classify_key("King Pin Setting"), SpecCategory::Gooseneck);
    }

    #[test]
    fn test_classify_misc() {
        assert_eq!(classify_key("Axles"), SpecCategory::Axles);
        assert_eq!(classify_key("Empty Weight"), SpecCategory::Weight);
        assert_eq!(classify_key("Suspension"), SpecCategory::Suspension);
        assert_eq!(classify_key("Tire Size"), SpecCategory::Tires);
        assert_eq!(classify_key("Lighting"), SpecCategory::Electrical);
        assert_eq!(classify_key("Floor Material"), SpecCategory::General);
    }

    #[test]
    fn test_classify_is_stateless() {
        // Same key, same category, however many times it is asked.
        let first = classify_key("Deck Width");
        for _ in 0..3 {
            assert_eq!(classify_key("Deck Width"), first);
        }
    }
}
