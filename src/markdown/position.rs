//! Output buffer with UTF-16 position tracking
//!
//! Every piece of rendered text goes through [`OutputBuffer::push_str`], which
//! keeps the running UTF-16 offset in step with the UTF-8 string. Entity
//! offsets are read from here and nowhere else.

// ─────────────────────────────────────────────────────────────────────────────
// PositionTracker
// ─────────────────────────────────────────────────────────────────────────────

/// Running count of UTF-16 code units appended so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionTracker {
    offset: usize,
}

impl PositionTracker {
    /// Create a tracker at offset zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance past `text`: one unit per BMP scalar, two per surrogate pair.
    pub fn append(&mut self, text: &str) {
        for ch in text.chars() {
            self.offset += if (ch as u32) <= 0xFFFF { 1 } else { 2 };
        }
    }

    /// The current offset in UTF-16 code units.
    pub fn current_offset(&self) -> usize {
        self.offset
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OutputBuffer
// ─────────────────────────────────────────────────────────────────────────────

/// The flat text being rendered, paired with its position tracker.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    text: String,
    position: PositionTracker,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text, normalizing `\r\n` to `\n`.
    pub fn push_str(&mut self, text: &str) {
        if text.contains('\r') {
            let normalized = text.replace("\r\n", "\n");
            self.position.append(&normalized);
            self.text.push_str(&normalized);
        } else {
            self.position.append(text);
            self.text.push_str(text);
        }
    }

    /// Current UTF-16 offset of the end of the buffer.
    pub fn offset(&self) -> usize {
        self.position.current_offset()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append a newline unless the buffer is empty or already ends with one.
    pub fn ensure_newline(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.push_str("\n");
        }
    }

    /// Make sure a blank line separates what follows from existing output.
    /// Does nothing on an empty buffer.
    pub fn ensure_blank_line(&mut self) {
        if self.text.is_empty() {
            return;
        }
        self.ensure_newline();
        if !self.text.ends_with("\n\n") {
            self.push_str("\n");
        }
    }

    /// Consume the buffer, dropping trailing newlines.
    pub fn into_trimmed(self) -> String {
        let mut text = self.text;
        let trimmed_len = text.trim_end_matches(['\n', '\r']).len();
        text.truncate(trimmed_len);
        text
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string_utils::utf16_len;

    #[test]
    fn test_tracker_counts_bmp_as_one() {
        let mut tracker = PositionTracker::new();
        tracker.append("Hei på • 中");
        assert_eq!(tracker.current_offset(), 10);
    }

    #[test]
    fn test_tracker_counts_surrogate_pairs_as_two() {
        let mut tracker = PositionTracker::new();
        tracker.append("🎉");
        assert_eq!(tracker.current_offset(), 2);
        tracker.append("a𠀀b");
        assert_eq!(tracker.current_offset(), 6);
    }

    #[test]
    fn test_tracker_agrees_with_utf16_len() {
        let text = "Mixed: ascii, ñ, 日本語, 👩‍💻, 𝕏";
        let mut tracker = PositionTracker::new();
        tracker.append(text);
        assert_eq!(tracker.current_offset(), utf16_len(text));
        assert_eq!(tracker.current_offset(), text.encode_utf16().count());
    }

    #[test]
    fn test_buffer_normalizes_crlf() {
        let mut buffer = OutputBuffer::new();
        buffer.push_str("a\r\nb");
        assert_eq!(buffer.offset(), 3);
        assert_eq!(buffer.into_trimmed(), "a\nb");
    }

    #[test]
    fn test_ensure_newline() {
        let mut buffer = OutputBuffer::new();
        buffer.ensure_newline();
        assert!(buffer.is_empty());

        buffer.push_str("Hello");
        buffer.ensure_newline();
        buffer.ensure_newline();
        assert_eq!(buffer.offset(), 6);
    }

    #[test]
    fn test_ensure_blank_line() {
        let mut buffer = OutputBuffer::new();
        buffer.ensure_blank_line();
        assert!(buffer.is_empty());

        buffer.push_str("Hello\n");
        buffer.ensure_blank_line();
        buffer.ensure_blank_line();
        buffer.push_str("World");
        assert_eq!(buffer.into_trimmed(), "Hello\n\nWorld");
    }

    #[test]
    fn test_into_trimmed_keeps_interior_whitespace() {
        let mut buffer = OutputBuffer::new();
        buffer.push_str("  a\n\n b  \n\n\n");
        assert_eq!(buffer.into_trimmed(), "  a\n\n b  ");
    }
}
