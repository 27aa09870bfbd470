//! Markdown to rich text conversion
//!
//! Walks the parsed tree depth-first, writing flattened text into an
//! [`OutputBuffer`] and recording an entity for every formatting construct.
//! Entity spans come from the tree structure, never from the rendered text,
//! so nested and adjacent formatting resolve correctly.

use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, EntityRecorder, MessageEntity};
use super::parser::{parse_markdown, Node, NodeKind};
use super::position::OutputBuffer;
use super::table::render_table;
use crate::error::{Result, ResultExt};

/// Prefix written before every list item.
const BULLET: &str = "• ";

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Plain text plus the entities that format it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedText {
    pub text: String,
    pub entities: Vec<MessageEntity>,
}

impl FormattedText {
    /// Unformatted text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entities: Vec::new(),
        }
    }
}

/// Convert model-produced markdown into plain text and rich text entities.
///
/// Never fails: malformed syntax renders as literal text, and if the tree
/// cannot be built at all the input comes back unchanged with no entities.
///
/// # Example
/// ```ignore
/// let formatted = convert("Hello **world!**");
/// assert_eq!(formatted.text, "Hello world!");
/// assert_eq!(formatted.entities[0].offset, 6);
/// ```
pub fn convert(markdown: &str) -> FormattedText {
    try_convert(markdown).unwrap_or_warn_default(
        FormattedText::plain(markdown),
        "Failed to convert markdown, sending it unformatted",
    )
}

/// Conversion with the parse failure exposed.
pub fn try_convert(markdown: &str) -> Result<FormattedText> {
    let root = parse_markdown(markdown)?;
    let mut converter = Converter::new();
    converter.visit(&root, None);
    Ok(converter.finish())
}

// ─────────────────────────────────────────────────────────────────────────────
// Converter
// ─────────────────────────────────────────────────────────────────────────────

/// Traversal state for a single conversion.
struct Converter {
    out: OutputBuffer,
    entities: EntityRecorder,
}

impl Converter {
    fn new() -> Self {
        Self {
            out: OutputBuffer::new(),
            entities: EntityRecorder::new(),
        }
    }

    fn finish(self) -> FormattedText {
        let text = self.out.into_trimmed();
        let entities = self.entities.finish(&text);
        FormattedText { text, entities }
    }

    /// Render `node`. `previous` is the preceding sibling within the same
    /// parent, if any.
    fn visit(&mut self, node: &Node, previous: Option<&Node>) {
        match &node.kind {
            NodeKind::Document | NodeKind::ListItem | NodeKind::Image | NodeKind::Other => {
                self.visit_children(node)
            }
            NodeKind::Paragraph => self.visit_paragraph(node, previous),
            NodeKind::Heading { level } => self.visit_heading(node, *level),
            NodeKind::Strong => self.visit_scoped(node, EntityKind::Bold),
            NodeKind::Emph => self.visit_scoped(node, EntityKind::Italic),
            NodeKind::Strikethrough => self.visit_scoped(node, EntityKind::Strikethrough),
            NodeKind::InlineCode(literal) => self.visit_inline_code(literal),
            NodeKind::Link { destination } => self.visit_link(node, destination),
            NodeKind::CodeBlock { info, literal } => self.visit_code_block(info, literal),
            NodeKind::List { ordered, .. } => self.visit_list(node, *ordered),
            NodeKind::BlockQuote => self.visit_scoped(node, EntityKind::Blockquote),
            NodeKind::Table => self.visit_table(node),
            // Rows and cells are only reached through visit_table
            NodeKind::TableRow { .. } | NodeKind::TableCell => self.visit_children(node),
            NodeKind::Text(literal) | NodeKind::HtmlInline(literal) => self.out.push_str(literal),
            NodeKind::SoftBreak | NodeKind::LineBreak => self.out.push_str("\n"),
            NodeKind::HtmlBlock(literal) => {
                self.out.ensure_newline();
                self.out.push_str(literal.trim_end_matches('\n'));
            }
            NodeKind::ThematicBreak => {}
        }
    }

    fn visit_children(&mut self, node: &Node) {
        let mut previous = None;
        for child in &node.children {
            self.visit(child, previous);
            previous = Some(child);
        }
    }

    /// Render children inside a single entity of `kind`.
    fn visit_scoped(&mut self, node: &Node, kind: EntityKind) {
        let scope = self
            .entities
            .begin(self.out.offset(), vec![MessageEntity::new(kind, 0, 0)]);
        self.visit_children(node);
        self.entities.end(scope, self.out.offset());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Blocks
    // ─────────────────────────────────────────────────────────────────────────

    fn visit_paragraph(&mut self, node: &Node, previous: Option<&Node>) {
        if previous.is_some() {
            self.out.ensure_newline();
        }
        self.visit_children(node);
    }

    fn visit_heading(&mut self, node: &Node, level: u8) {
        let mut entities = vec![MessageEntity::new(EntityKind::Underline, 0, 0)];
        if level == 1 {
            entities.push(MessageEntity::new(EntityKind::Bold, 0, 0));
        }

        self.out.ensure_blank_line();
        let scope = self.entities.begin(self.out.offset(), entities);
        self.visit_children(node);
        self.entities.end(scope, self.out.offset());
        self.out.push_str("\n");
    }

    /// Items of both list kinds start with the bullet; ordered items are
    /// renumbered by position, whatever digits the source used.
    fn visit_list(&mut self, node: &Node, ordered: bool) {
        self.out.ensure_newline();
        let items = node
            .children
            .iter()
            .filter(|child| child.kind == NodeKind::ListItem);
        for (index, item) in items.enumerate() {
            self.out.ensure_newline();
            self.out.push_str(BULLET);
            if ordered {
                self.out.push_str(&format!("{}. ", index + 1));
            }
            self.visit(item, None);
        }
        self.out.ensure_newline();
    }

    fn visit_code_block(&mut self, info: &str, literal: &str) {
        self.out.ensure_newline();

        let mut entity = MessageEntity::new(EntityKind::CodeBlock, 0, 0);
        if let Some(language) = info.split_whitespace().next() {
            entity = entity.with_language(language);
        }

        let scope = self.entities.begin(self.out.offset(), vec![entity]);
        self.out.push_str(trim_blank_lines(literal));
        self.entities.end(scope, self.out.offset());
    }

    fn visit_table(&mut self, node: &Node) {
        self.out.ensure_newline();
        let scope = self.entities.begin(
            self.out.offset(),
            vec![MessageEntity::new(EntityKind::CodeBlock, 0, 0)],
        );
        self.out.push_str(&render_table(node));
        self.entities.end(scope, self.out.offset());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inlines
    // ─────────────────────────────────────────────────────────────────────────

    fn visit_inline_code(&mut self, literal: &str) {
        let scope = self.entities.begin(
            self.out.offset(),
            vec![MessageEntity::new(EntityKind::Code, 0, 0)],
        );
        self.out.push_str(literal);
        self.entities.end(scope, self.out.offset());
    }

    fn visit_link(&mut self, node: &Node, destination: &str) {
        let scope = self.entities.begin(
            self.out.offset(),
            vec![MessageEntity::new(EntityKind::TextLink, 0, 0).with_url(destination)],
        );
        self.visit_children(node);
        self.entities.end(scope, self.out.offset());
    }
}

/// Strip blank lines (lines holding only whitespace) from both ends of a
/// code block. Everything between, indentation and trailing spaces
/// included, is kept verbatim.
fn trim_blank_lines(literal: &str) -> &str {
    let mut start = 0;
    for line in literal.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }

    let mut end = literal.len();
    for line in literal[start..].split_inclusive('\n').rev() {
        if !line.trim().is_empty() {
            break;
        }
        end -= line.len();
    }

    // Only the line break of the last line goes; its trailing spaces stay
    literal[start..end].trim_end_matches(|c: char| c == '\n' || c == '\r')
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
