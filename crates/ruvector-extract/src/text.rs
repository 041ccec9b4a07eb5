//! Text normalization shared by every extraction path

use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

const BOM: char = '\u{FEFF}';

/// Normalize extracted content.
///
/// Recovers UTF-16 text that was decoded byte-wise (detected by embedded
/// null characters), strips leading byte order marks and converts the
/// result to canonical composed form (NFC). Applying it twice yields the
/// same string as applying it once.
pub fn normalize_content(raw: &str) -> String {
    let recovered: Cow<'_, str> = if raw.contains('\0') {
        Cow::Owned(recover_utf16(raw))
    } else {
        Cow::Borrowed(raw)
    };

    recovered.trim_start_matches(BOM).nfc().collect()
}

/// Decode raw file bytes, honoring UTF-8 and UTF-16 byte order marks
pub fn decode_bytes(bytes: &[u8]) -> String {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, false),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, true),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Collapse every whitespace run to a single space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of characters once surrounding whitespace is removed
pub fn stripped_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// Last `n` characters of `text`
pub fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

/// First `n` characters of `text`
pub fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Reassemble text whose UTF-16 code units were read as single bytes.
///
/// Byte order is inferred from which half of each pair holds the nulls.
/// Anything that does not reassemble cleanly just loses its nulls.
fn recover_utf16(raw: &str) -> String {
    let bytes: Option<Vec<u8>> = raw
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();

    if let Some(bytes) = bytes.filter(|b| b.len() % 2 == 0) {
        let even_nulls = bytes.iter().step_by(2).filter(|b| **b == 0).count();
        let odd_nulls = bytes.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
        let pairs = bytes.len() / 2;

        if even_nulls.max(odd_nulls) * 2 >= pairs && even_nulls.min(odd_nulls) == 0 {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| {
                    if even_nulls > odd_nulls {
                        u16::from_be_bytes([pair[0], pair[1]])
                    } else {
                        u16::from_le_bytes([pair[0], pair[1]])
                    }
                })
                .collect();
            if let Ok(decoded) = String::from_utf16(&units) {
                return decoded.replace('\0', "");
            }
        }
    }

    raw.replace('\0', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_leading_bom() {
        assert_eq!(normalize_content("\u{FEFF}hello"), "hello");
        assert_eq!(normalize_content("a\u{FEFF}b"), "a\u{FEFF}b");
    }

    #[test]
    fn test_composes_to_nfc() {
        assert_eq!(normalize_content("e\u{0301}t\u{0065}\u{0301}"), "\u{00E9}t\u{00E9}");
    }

    #[test]
    fn test_recovers_little_endian_utf16() {
        let raw = "H\0e\0l\0l\0o\0";
        assert_eq!(normalize_content(raw), "Hello");
    }

    #[test]
    fn test_recovers_big_endian_utf16_with_bom() {
        let raw = "\u{FE}\u{FF}\0H\0i";
        assert_eq!(normalize_content(raw), "Hi");
    }

    #[test]
    fn test_stray_nulls_are_removed() {
        assert_eq!(normalize_content("caf\u{e9}\0 \u{2603}\0"), "caf\u{e9} \u{2603}");
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(decode_bytes(b"\xEF\xBB\xBFplain"), "plain");
        assert_eq!(decode_bytes(&[0xFF, 0xFE, b'o', 0, b'k', 0]), "ok");
        assert_eq!(decode_bytes(&[0xFE, 0xFF, 0, b'o', 0, b'k']), "ok");
    }

    #[test]
    fn test_char_slicing() {
        assert_eq!(tail_chars("h\u{e9}llo", 4), "\u{e9}llo");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("abc", 0), "");
        assert_eq!(head_chars("h\u{e9}llo", 2), "h\u{e9}");
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(stripped_len("  \u{e9}t\u{e9} \n"), 3);
    }

    proptest! {
        #[test]
        fn prop_normalization_is_idempotent(raw in "\\PC*") {
            let once = normalize_content(&raw);
            prop_assert_eq!(normalize_content(&once), once);
        }

        #[test]
        fn prop_idempotent_with_nulls_and_marks(raw in "[a-z\u{0}\u{FEFF}\u{0301}\u{FF}\u{FE}]{0,40}") {
            let once = normalize_content(&raw);
            prop_assert_eq!(normalize_content(&once), once);
        }
    }
}
