//! Outgoing reply preparation
//!
//! Converts the model's markdown answer and splits it into messages that
//! fit the platform's length limit, carrying each entity into every chunk
//! it overlaps.

use log::debug;

use crate::markdown::{convert, FormattedText, MessageEntity};
use crate::string_utils::{byte_index_at_utf16, utf16_len};

/// Longest message the platform accepts, in UTF-16 code units.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Convert a markdown answer into one or more messages ready to send.
pub fn prepare_reply(markdown: &str) -> Vec<FormattedText> {
    split_message(convert(markdown), MAX_MESSAGE_LENGTH)
}

/// Split formatted text into chunks of at most `max_units` UTF-16 units.
///
/// A chunk ends at the last newline inside the window when there is one
/// (the newline is dropped), otherwise at the last character that fits.
/// Entities are clipped to each chunk and rebased onto its start.
pub fn split_message(formatted: FormattedText, max_units: usize) -> Vec<FormattedText> {
    if utf16_len(&formatted.text) <= max_units {
        return vec![formatted];
    }

    let text = formatted.text.as_str();
    let mut chunks = Vec::new();
    let mut start_byte = 0;
    let mut start_units = 0;

    while start_byte < text.len() {
        let rest = &text[start_byte..];
        let window = byte_index_at_utf16(rest, max_units);

        let (chunk_len, consumed) = if window == rest.len() {
            (rest.len(), rest.len())
        } else {
            match rest[..window].rfind('\n') {
                Some(newline) if newline > 0 => (newline, newline + 1),
                _ => (window, window),
            }
        };

        // A window too small for the first character still has to make progress
        let (chunk_len, consumed) = if consumed == 0 {
            let first = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
            (first, first)
        } else {
            (chunk_len, consumed)
        };

        let chunk_text = &rest[..chunk_len];
        let chunk_units = utf16_len(chunk_text);
        if !chunk_text.is_empty() {
            chunks.push(FormattedText {
                text: chunk_text.to_string(),
                entities: clip_entities(&formatted.entities, start_units, start_units + chunk_units),
            });
        }

        start_units += utf16_len(&rest[..consumed]);
        start_byte += consumed;
    }

    debug!(
        "Split {} units of text into {} messages",
        utf16_len(text),
        chunks.len()
    );
    chunks
}

/// Entities overlapping `[start, end)`, clipped and shifted to start at zero.
fn clip_entities(entities: &[MessageEntity], start: usize, end: usize) -> Vec<MessageEntity> {
    entities
        .iter()
        .filter_map(|entity| {
            let clipped_start = entity.offset.max(start);
            let clipped_end = entity.end().min(end);
            if clipped_start >= clipped_end {
                return None;
            }
            let mut clipped = entity.clone();
            clipped.offset = clipped_start - start;
            clipped.length = clipped_end - clipped_start;
            Some(clipped)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::EntityKind;

    fn formatted(text: &str, entities: Vec<MessageEntity>) -> FormattedText {
        FormattedText {
            text: text.to_string(),
            entities,
        }
    }

    #[test]
    fn test_short_reply_is_single_message() {
        let messages = prepare_reply("Hello **world!**");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hello world!");
        assert_eq!(
            messages[0].entities,
            vec![MessageEntity::new(EntityKind::Bold, 6, 6)]
        );
    }

    #[test]
    fn test_split_prefers_newline() {
        let input = formatted("aaaa\nbbbb\ncc", Vec::new());
        let chunks = split_message(input, 10);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa\nbbbb", "cc"]);
    }

    #[test]
    fn test_split_hard_when_no_newline() {
        let input = formatted("abcdefghij", Vec::new());
        let chunks = split_message(input, 4);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_split_never_breaks_surrogate_pair() {
        let input = formatted("ab🎉cd", Vec::new());
        let chunks = split_message(input, 3);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "🎉c", "d"]);
        assert!(chunks.iter().all(|c| utf16_len(&c.text) <= 3));
    }

    #[test]
    fn test_split_tiny_window_still_progresses() {
        let input = formatted("🎉🎉", Vec::new());
        let chunks = split_message(input, 1);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_split_clips_and_rebases_entities() {
        // "aaaa\nbbbb": bold spans "aa\nbb", link covers "bbbb"
        let input = formatted(
            "aaaa\nbbbb",
            vec![
                MessageEntity::new(EntityKind::Bold, 2, 5),
                MessageEntity::new(EntityKind::TextLink, 5, 4).with_url("https://e.x"),
            ],
        );
        let chunks = split_message(input, 6);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "aaaa");
        assert_eq!(
            chunks[0].entities,
            vec![MessageEntity::new(EntityKind::Bold, 2, 2)]
        );
        assert_eq!(chunks[1].text, "bbbb");
        assert_eq!(
            chunks[1].entities,
            vec![
                MessageEntity::new(EntityKind::Bold, 0, 2),
                MessageEntity::new(EntityKind::TextLink, 0, 4).with_url("https://e.x"),
            ]
        );
    }

    #[test]
    fn test_long_reply_chunks_fit_limit() {
        let line = "🎉 **word** ".repeat(40);
        let markdown = vec![line; 30].join("\n\n");
        let messages = prepare_reply(&markdown);
        assert!(messages.len() > 1);
        for message in &messages {
            let len = utf16_len(&message.text);
            assert!(len <= MAX_MESSAGE_LENGTH);
            assert!(message.entities.iter().all(|e| e.end() <= len));
        }
    }
}
