//! Text cleanup for extracted HTML.

/// Collapse runs of whitespace (including newlines from pretty-printed
/// markup) into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a  b "), "a b");
        assert_eq!(collapse_whitespace("a\n\t b\n"), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }
}
