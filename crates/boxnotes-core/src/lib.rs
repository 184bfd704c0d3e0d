//! boxnotes-core - Box Notes block tree and renderers
//!
//! This crate provides the format-agnostic document model shared by the
//! legacy and modern Box Notes parsers (in the `boxnotes` crate), together
//! with the Markdown and plain text renderers that consume it.
//!
//! # Architecture
//!
//! ```text
//! legacy atext  ──decode──▶ ┌────────────┐ ──▶ Markdown
//!                           │ Block tree │
//! modern doc    ──walk────▶ └────────────┘ ──▶ Plain text
//! ```
//!
//! # Example
//!
//! ```rust
//! use boxnotes_core::{Block, Document, HeadingLevel, MarkdownRenderer, Renderer, TextSpan};
//!
//! let document = Document::new(vec![
//!     Block::heading(HeadingLevel::H1, vec![TextSpan::plain("Hello World")]),
//!     Block::paragraph(vec![TextSpan::plain("Some text.")]),
//! ]);
//!
//! let markdown = MarkdownRenderer::new().render(&document).unwrap();
//! assert_eq!(markdown, "# Hello World\n\nSome text.");
//! ```

mod markdown;
mod model;
mod options;
mod plaintext;
mod render;

pub use markdown::{escape_markdown, MarkdownRenderer};
pub use model::{
    spans_text, Attributes, Block, BlockType, Document, HeadingLevel, Image, List, ListItem,
    ListType, Table, TableCell, TableRow, TextAttributes, TextSpan,
};
pub use options::{MarkdownOptions, OutputFormat, PlainTextOptions, UnknownOutputFormat};
pub use plaintext::PlainTextRenderer;
pub use render::{RenderError, Renderer};

/// Render a document in the given format with default options
pub fn render(document: &Document, format: OutputFormat) -> Result<String, RenderError> {
    match format {
        OutputFormat::Markdown => MarkdownRenderer::new().render(document),
        OutputFormat::PlainText => PlainTextRenderer::new().render(document),
    }
}
