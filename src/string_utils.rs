//! UTF-16 Offset Utilities
//!
//! Rust strings are UTF-8 encoded, but the messaging platform measures text
//! offsets and lengths in UTF-16 code units. These helpers convert between
//! the two without ever slicing inside a character.
//!
//! # Problem
//! Characters like `å` or `中` are multi-byte in UTF-8 but a single UTF-16
//! unit, while characters outside the Basic Multilingual Plane (`🎉`, rare
//! CJK extensions) take four UTF-8 bytes and two UTF-16 units (a surrogate
//! pair). Byte length and `chars().count()` both disagree with the platform.
//!
//! # Example
//! ```ignore
//! use crate::string_utils::{utf16_len, byte_index_at_utf16};
//!
//! assert_eq!(utf16_len("Hi🎉"), 4);
//! assert_eq!(byte_index_at_utf16("Hi🎉", 3), 2); // never splits the pair
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Length Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Number of UTF-16 code units needed to encode `s`.
#[inline]
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Index Conversion Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the largest byte index on a character boundary whose prefix
/// occupies at most `units` UTF-16 code units.
///
/// If `units` covers the whole string, returns the string length. A target
/// that falls between the two halves of a surrogate pair floors to the start
/// of that character.
pub fn byte_index_at_utf16(s: &str, units: usize) -> usize {
    let mut consumed = 0;
    for (byte_index, ch) in s.char_indices() {
        let next = consumed + ch.len_utf16();
        if next > units {
            return byte_index;
        }
        consumed = next;
    }
    s.len()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // utf16_len Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_utf16_len_ascii() {
        assert_eq!(utf16_len(""), 0);
        assert_eq!(utf16_len("Hello"), 5);
    }

    #[test]
    fn test_utf16_len_bmp() {
        // Each is a single code unit even though UTF-8 needs 2-3 bytes
        assert_eq!(utf16_len("Hei på deg"), 10);
        assert_eq!(utf16_len("你好"), 2);
        assert_eq!(utf16_len("•"), 1);
    }

    #[test]
    fn test_utf16_len_surrogate_pairs() {
        assert_eq!(utf16_len("🎉"), 2);
        assert_eq!(utf16_len("Hi🎉Bye"), 7);
        // CJK Extension B
        assert_eq!(utf16_len("𠀀"), 2);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Index Conversion Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_byte_index_at_utf16_ascii() {
        assert_eq!(byte_index_at_utf16("Hello", 0), 0);
        assert_eq!(byte_index_at_utf16("Hello", 3), 3);
        assert_eq!(byte_index_at_utf16("Hello", 100), 5);
    }

    #[test]
    fn test_byte_index_at_utf16_never_splits_pair() {
        let s = "Hi🎉Bye";
        assert_eq!(byte_index_at_utf16(s, 2), 2);
        assert_eq!(byte_index_at_utf16(s, 3), 2); // Middle of the pair floors
        assert_eq!(byte_index_at_utf16(s, 4), 6);
        assert_eq!(&s[byte_index_at_utf16(s, 4)..], "Bye");
    }

    #[test]
    fn test_mixed_content_round_trip_boundaries() {
        let s = "Hello 世界! 🎉 Café naïve";
        for units in 0..=utf16_len(s) + 2 {
            let index = byte_index_at_utf16(s, units);
            assert!(s.is_char_boundary(index));
            assert!(utf16_len(&s[..index]) <= units);
        }
    }
}
