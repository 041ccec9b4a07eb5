//! Native-vs-scanned page decision

use serde::Serialize;

use crate::text::stripped_len;

/// How a page's content has to be recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageClass {
    /// Enough machine-readable text to read directly
    Native,
    /// Content only available as pixels
    Scanned,
}

/// Classify a page from its machine-readable text.
///
/// Surrounding whitespace does not count, so a page holding only a short
/// footer or watermark is still treated as scanned.
pub fn classify_page(text: &str, text_threshold: usize) -> PageClass {
    if stripped_len(text) >= text_threshold {
        PageClass::Native
    } else {
        PageClass::Scanned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(classify_page(&"a".repeat(19), 20), PageClass::Scanned);
        assert_eq!(classify_page(&"a".repeat(20), 20), PageClass::Native);
    }

    #[test]
    fn test_whitespace_does_not_count() {
        let padded = format!("  {}\n\n\t ", "x".repeat(19));
        assert_eq!(classify_page(&padded, 20), PageClass::Scanned);
        assert_eq!(classify_page(&" ".repeat(20), 20), PageClass::Scanned);
    }

    #[test]
    fn test_zero_threshold_is_always_native() {
        assert_eq!(classify_page("", 0), PageClass::Native);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(classify_page(&"\u{e9}".repeat(20), 20), PageClass::Native);
        assert_eq!(classify_page(&"\u{e9}".repeat(10), 20), PageClass::Scanned);
    }
}
