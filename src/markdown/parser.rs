//! Markdown parser implementation using comrak
//!
//! This module wraps comrak's parsing function and converts its arena-based
//! AST into an owned, read-only tree over a closed set of node kinds. The
//! renderer matches on that set exhaustively.

use comrak::{
    nodes::{AstNode, ListType as ComrakListType, NodeValue},
    parse_document, Arena, Options,
};

use crate::error::{Error, Result};

/// Deepest node nesting the converter will follow.
///
/// Conversion and rendering both recurse once per level; pathological input
/// such as thousands of nested `>` markers is rejected here instead.
pub const MAX_NESTING_DEPTH: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for markdown parsing.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Enable autolink URLs and emails
    pub autolink: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();

        // Extension options
        options.extension.strikethrough = self.strikethrough;
        options.extension.table = self.tables;
        options.extension.autolink = self.autolink;

        options
    }
}

/// The kind of a markdown node, together with any data it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root document node
    Document,
    /// Paragraph
    Paragraph,
    /// Heading (level 1-6)
    Heading { level: u8 },
    /// Strong emphasis (bold)
    Strong,
    /// Emphasis (italic)
    Emph,
    /// Strikethrough
    Strikethrough,
    /// Inline code
    InlineCode(String),
    /// Link or autolink
    Link { destination: String },
    /// Fenced or indented code block
    CodeBlock { info: String, literal: String },
    /// List container
    List { ordered: bool, start: usize },
    /// List item
    ListItem,
    /// Block quote (>)
    BlockQuote,
    /// Table
    Table,
    /// Table row
    TableRow { header: bool },
    /// Table cell
    TableCell,
    /// Inline text content
    Text(String),
    /// Soft line break
    SoftBreak,
    /// Hard line break
    LineBreak,
    /// Raw HTML block, kept as literal text
    HtmlBlock(String),
    /// Raw inline HTML, kept as literal text
    HtmlInline(String),
    /// Thematic break (horizontal rule)
    ThematicBreak,
    /// Image; its children hold the alt text
    Image,
    /// Any other construct; only its children are rendered
    Other,
}

/// A node in the markdown tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The kind of this node
    pub kind: NodeKind,
    /// Child nodes, in document order
    pub children: Vec<Node>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Get the literal text of this node and its descendants, with all
    /// formatting discarded. Line breaks flatten to a single space.
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, output: &mut String) {
        match &self.kind {
            NodeKind::Text(t) | NodeKind::InlineCode(t) | NodeKind::HtmlInline(t) => {
                output.push_str(t)
            }
            NodeKind::SoftBreak | NodeKind::LineBreak => output.push(' '),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(output);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Parse markdown text into a node tree using the default extensions
/// (tables, strikethrough, autolinks).
///
/// Unterminated syntax never fails: comrak keeps it as literal text. The
/// only error is [`Error::NestingTooDeep`].
pub fn parse_markdown(markdown: &str) -> Result<Node> {
    parse_markdown_with_options(markdown, &MarkdownOptions::default())
}

/// Parse markdown text with custom options.
pub fn parse_markdown_with_options(markdown: &str, options: &MarkdownOptions) -> Result<Node> {
    let arena = Arena::new();
    let comrak_options = options.to_comrak_options();

    let root = parse_document(&arena, markdown, &comrak_options);

    convert_node(root, 0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Conversion Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a comrak AST node to our Node structure.
fn convert_node<'a>(node: &'a AstNode<'a>, depth: usize) -> Result<Node> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Error::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }

    let kind = convert_node_value(&node.data.borrow().value);
    let mut converted = Node::new(kind);

    for child in node.children() {
        converted.children.push(convert_node(child, depth + 1)?);
    }

    Ok(converted)
}

/// Convert a comrak NodeValue to our NodeKind.
fn convert_node_value(value: &NodeValue) -> NodeKind {
    match value {
        NodeValue::Document => NodeKind::Document,
        NodeValue::Paragraph => NodeKind::Paragraph,
        NodeValue::Heading(heading) => NodeKind::Heading {
            level: heading.level,
        },
        NodeValue::Strong => NodeKind::Strong,
        NodeValue::Emph => NodeKind::Emph,
        NodeValue::Strikethrough => NodeKind::Strikethrough,
        NodeValue::Code(code) => NodeKind::InlineCode(code.literal.clone()),
        NodeValue::Link(link) => NodeKind::Link {
            destination: link.url.clone(),
        },
        NodeValue::CodeBlock(code) => NodeKind::CodeBlock {
            info: code.info.clone(),
            literal: code.literal.clone(),
        },
        NodeValue::List(list) => NodeKind::List {
            ordered: list.list_type == ComrakListType::Ordered,
            start: list.start,
        },
        NodeValue::Item(_) => NodeKind::ListItem,
        NodeValue::BlockQuote => NodeKind::BlockQuote,
        NodeValue::Table(_) => NodeKind::Table,
        NodeValue::TableRow(header) => NodeKind::TableRow { header: *header },
        NodeValue::TableCell => NodeKind::TableCell,
        NodeValue::Text(text) => NodeKind::Text(text.clone()),
        NodeValue::SoftBreak => NodeKind::SoftBreak,
        NodeValue::LineBreak => NodeKind::LineBreak,
        NodeValue::HtmlBlock(html) => NodeKind::HtmlBlock(html.literal.clone()),
        NodeValue::HtmlInline(html) => NodeKind::HtmlInline(html.clone()),
        NodeValue::ThematicBreak => NodeKind::ThematicBreak,
        NodeValue::Image(_) => NodeKind::Image,
        // Extensions that are not enabled, and node types added in future versions
        _ => NodeKind::Other,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
