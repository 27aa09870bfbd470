//! Markdown to rich text conversion
//!
//! This module turns the markdown a language model produces into the
//! representation the messaging platform understands: flat text plus a list
//! of formatting entities with UTF-16 offsets. Parsing is delegated to
//! comrak, a CommonMark + GFM compatible parser.
//!
//! # Features
//! - Bold, italic, strikethrough, inline code and links as inline entities
//! - Headings, lists, block quotes and fenced code blocks as block layout
//! - Tables laid out as a fixed-width grid inside a code block
//! - Offsets measured in UTF-16 code units, surrogate pairs included
//!
//! # Example
//! ```ignore
//! use gptbot::markdown::convert;
//!
//! let formatted = convert("Hello [world](https://example.com)!");
//! assert_eq!(formatted.text, "Hello world!");
//! assert_eq!(formatted.entities[0].url.as_deref(), Some("https://example.com"));
//! ```

mod entity;
mod parser;
mod position;
mod render;
mod table;

pub use entity::{EntityKind, MessageEntity};
pub use parser::{
    parse_markdown, parse_markdown_with_options, MarkdownOptions, Node, NodeKind,
    MAX_NESTING_DEPTH,
};
pub use render::{convert, try_convert, FormattedText};
