//! Rich text entities and the scope manager that records them
//!
//! An entity describes a formatting span over the flattened output text.
//! Offsets and lengths are in UTF-16 code units, as the messaging platform
//! expects. Entities serialize with the platform's field and kind names.

use serde::{Deserialize, Serialize};

use crate::string_utils::utf16_len;

// ─────────────────────────────────────────────────────────────────────────────
// Entity Types
// ─────────────────────────────────────────────────────────────────────────────

/// Formatting kind of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    /// Inline monospace
    Code,
    /// Monospace block, optionally tagged with a language
    #[serde(rename = "pre")]
    CodeBlock,
    /// Clickable text pointing at a URL
    TextLink,
    Blockquote,
}

/// A formatting span over the output text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Start, in UTF-16 code units
    pub offset: usize,
    /// Length, in UTF-16 code units
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl MessageEntity {
    /// Create an entity with no URL or language.
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            language: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope Manager
// ─────────────────────────────────────────────────────────────────────────────

/// An open scope: the offset captured before a subtree was rendered and the
/// entity slots reserved for it.
#[derive(Debug)]
#[must_use = "an open scope must be closed with EntityRecorder::end"]
pub struct Scope {
    start: usize,
    first_slot: usize,
    slots: usize,
}

impl Scope {
    /// Offset captured when the scope was opened.
    pub fn start(&self) -> usize {
        self.start
    }
}

/// Records entities in the order their scopes are opened.
///
/// [`begin`](Self::begin) reserves a slot per entity at the current offset,
/// so a parent always precedes its children even though the parent's length
/// is only known after the children are rendered. Each caller holds its own
/// [`Scope`], which is what lets scopes nest without a shared stack.
#[derive(Debug, Default)]
pub struct EntityRecorder {
    entities: Vec<MessageEntity>,
}

impl EntityRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope at `offset` for one or more entities sharing a span.
    /// Offsets and lengths of `entities` are overwritten.
    pub fn begin(&mut self, offset: usize, entities: Vec<MessageEntity>) -> Scope {
        let first_slot = self.entities.len();
        let slots = entities.len();
        self.entities.extend(entities.into_iter().map(|mut entity| {
            entity.offset = offset;
            entity.length = 0;
            entity
        }));
        Scope {
            start: offset,
            first_slot,
            slots,
        }
    }

    /// Close `scope` at `offset`, giving every entity it holds the length
    /// `offset - scope.start`.
    pub fn end(&mut self, scope: Scope, offset: usize) {
        let length = offset.saturating_sub(scope.start);
        for entity in &mut self.entities[scope.first_slot..scope.first_slot + scope.slots] {
            entity.length = length;
        }
    }

    /// Finish recording against the final text.
    ///
    /// Entities are clamped to the text (trailing newline trimming can cut
    /// the end of a span) and empty ones are dropped.
    pub fn finish(self, text: &str) -> Vec<MessageEntity> {
        let text_len = utf16_len(text);
        self.entities
            .into_iter()
            .filter_map(|mut entity| {
                let end = entity.end().min(text_len);
                if entity.offset >= end {
                    return None;
                }
                entity.length = end - entity.offset;
                Some(entity)
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes_keep_open_order() {
        let mut recorder = EntityRecorder::new();
        let outer = recorder.begin(0, vec![MessageEntity::new(EntityKind::Bold, 0, 0)]);
        let inner = recorder.begin(2, vec![MessageEntity::new(EntityKind::Italic, 0, 0)]);
        recorder.end(inner, 5);
        recorder.end(outer, 8);

        let entities = recorder.finish("12345678");
        assert_eq!(
            entities,
            vec![
                MessageEntity::new(EntityKind::Bold, 0, 8),
                MessageEntity::new(EntityKind::Italic, 2, 3),
            ]
        );
    }

    #[test]
    fn test_shared_scope_gives_identical_spans() {
        let mut recorder = EntityRecorder::new();
        let scope = recorder.begin(
            1,
            vec![
                MessageEntity::new(EntityKind::Underline, 0, 0),
                MessageEntity::new(EntityKind::Bold, 0, 0),
            ],
        );
        assert_eq!(scope.start(), 1);
        recorder.end(scope, 4);

        let entities = recorder.finish("abcd");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].kind, EntityKind::Underline);
        assert_eq!(entities[1].kind, EntityKind::Bold);
        assert!(entities.iter().all(|e| e.offset == 1 && e.length == 3));
    }

    #[test]
    fn test_finish_clamps_and_drops_empty() {
        let mut recorder = EntityRecorder::new();
        let empty = recorder.begin(2, vec![MessageEntity::new(EntityKind::TextLink, 0, 0)]);
        recorder.end(empty, 2);
        let long = recorder.begin(1, vec![MessageEntity::new(EntityKind::Blockquote, 0, 0)]);
        recorder.end(long, 10);

        let entities = recorder.finish("abc");
        assert_eq!(entities, vec![MessageEntity::new(EntityKind::Blockquote, 1, 2)]);
    }

    #[test]
    fn test_entity_serializes_with_platform_names() {
        let entity = MessageEntity::new(EntityKind::CodeBlock, 6, 11).with_language("bash");
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "pre", "offset": 6, "length": 11, "language": "bash"})
        );

        let link = MessageEntity::new(EntityKind::TextLink, 0, 4).with_url("https://example.com");
        let json = serde_json::to_string(&link).unwrap();
        assert_eq!(
            json,
            r#"{"type":"text_link","offset":0,"length":4,"url":"https://example.com"}"#
        );
    }

    #[test]
    fn test_entity_kind_names() {
        let names: Vec<String> = [
            EntityKind::Bold,
            EntityKind::Italic,
            EntityKind::Underline,
            EntityKind::Strikethrough,
            EntityKind::Code,
            EntityKind::Blockquote,
        ]
        .iter()
        .map(|kind| serde_json::to_string(kind).unwrap())
        .collect();
        assert_eq!(
            names,
            vec![
                "\"bold\"",
                "\"italic\"",
                "\"underline\"",
                "\"strikethrough\"",
                "\"code\"",
                "\"blockquote\""
            ]
        );
    }
}
