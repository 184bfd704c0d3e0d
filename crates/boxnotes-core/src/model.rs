//! Box Notes block tree
//!
//! This module defines the format-agnostic document model. Both the legacy
//! and the modern parser produce it; both renderers consume it.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Opaque source metadata attached to a block. Renderers never read it.
pub type Attributes = Map<String, Value>;

/// Formatting applied to a run of text. All flags are independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextAttributes {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub underline: bool,
    pub strike: bool,
    pub link: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub highlight: Option<String>,
}

impl TextAttributes {
    /// True when no flag is set and no value is present
    pub fn is_empty(&self) -> bool {
        !(self.bold
            || self.italic
            || self.code
            || self.underline
            || self.strike
            || self.link.is_some()
            || self.color.is_some()
            || self.size.is_some()
            || self.highlight.is_some())
    }
}

/// A run of text with uniform formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSpan {
    pub text: String,
    pub attributes: TextAttributes,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, attributes: TextAttributes) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }

    /// A span without any formatting
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextAttributes::default())
    }
}

/// Concatenate the text of a span sequence, ignoring formatting
pub fn spans_text(spans: &[TextSpan]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}

/// Heading depth. Box Notes only knows three levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum HeadingLevel {
    #[default]
    H1 = 1,
    H2 = 2,
    H3 = 3,
}

impl HeadingLevel {
    /// Map 1, 2 or 3 to a level; anything else yields `None`
    pub fn new(level: u64) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }

    /// Like [`HeadingLevel::new`] but falls back to H1
    pub fn clamped(level: u64) -> Self {
        Self::new(level).unwrap_or_default()
    }

    pub fn get(self) -> u8 {
        self as u8
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> u8 {
        level.get()
    }
}

/// Kind of list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    #[default]
    Bullet,
    Ordered,
    Check,
}

/// Discriminant of every node kind in the tree, including the ones that only
/// appear nested (list items, rows, cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading,
    CodeBlock,
    BlockQuote,
    HorizontalRule,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    Image,
}

/// A top-level block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Vec<TextSpan>,
        attributes: Attributes,
    },

    Heading {
        level: HeadingLevel,
        content: Vec<TextSpan>,
        attributes: Attributes,
    },

    CodeBlock {
        content: Vec<TextSpan>,
        attributes: Attributes,
    },

    BlockQuote {
        content: Vec<TextSpan>,
        attributes: Attributes,
    },

    HorizontalRule {
        attributes: Attributes,
    },

    List(List),

    Table(Table),

    Image(Image),
}

/// A bullet, ordered or check list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub list_type: ListType,
    pub items: Vec<ListItem>,
    pub attributes: Attributes,
}

/// One entry of a list. `children` only ever holds nested lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListItem {
    pub content: Vec<TextSpan>,
    pub children: Vec<List>,
    /// Set for check list items only
    pub checked: Option<bool>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableCell {
    pub content: Vec<TextSpan>,
    pub attributes: Attributes,
}

/// An embedded image. `path` points at an extracted copy when one exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Image {
    pub url: Option<String>,
    pub path: Option<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub attributes: Attributes,
}

impl Block {
    pub fn paragraph(content: Vec<TextSpan>) -> Self {
        Block::Paragraph {
            content,
            attributes: Attributes::new(),
        }
    }

    pub fn heading(level: HeadingLevel, content: Vec<TextSpan>) -> Self {
        Block::Heading {
            level,
            content,
            attributes: Attributes::new(),
        }
    }

    pub fn code_block(content: Vec<TextSpan>) -> Self {
        Block::CodeBlock {
            content,
            attributes: Attributes::new(),
        }
    }

    pub fn block_quote(content: Vec<TextSpan>) -> Self {
        Block::BlockQuote {
            content,
            attributes: Attributes::new(),
        }
    }

    pub fn horizontal_rule() -> Self {
        Block::HorizontalRule {
            attributes: Attributes::new(),
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Paragraph { .. } => BlockType::Paragraph,
            Block::Heading { .. } => BlockType::Heading,
            Block::CodeBlock { .. } => BlockType::CodeBlock,
            Block::BlockQuote { .. } => BlockType::BlockQuote,
            Block::HorizontalRule { .. } => BlockType::HorizontalRule,
            Block::List(_) => BlockType::List,
            Block::Table(_) => BlockType::Table,
            Block::Image(_) => BlockType::Image,
        }
    }

    /// Inline content of leaf blocks; empty for containers
    pub fn content(&self) -> &[TextSpan] {
        match self {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::CodeBlock { content, .. }
            | Block::BlockQuote { content, .. } => content.as_slice(),
            Block::HorizontalRule { .. } | Block::List(_) | Block::Table(_) | Block::Image(_) => &[],
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            Block::Paragraph { attributes, .. }
            | Block::Heading { attributes, .. }
            | Block::CodeBlock { attributes, .. }
            | Block::BlockQuote { attributes, .. }
            | Block::HorizontalRule { attributes } => attributes,
            Block::List(list) => &list.attributes,
            Block::Table(table) => &table.attributes,
            Block::Image(image) => &image.attributes,
        }
    }

    /// Text of this block's own content, children excluded
    pub fn text(&self) -> String {
        spans_text(self.content())
    }

    pub fn has_children(&self) -> bool {
        match self {
            Block::List(list) => !list.items.is_empty(),
            Block::Table(table) => !table.rows.is_empty(),
            _ => false,
        }
    }

    /// Number of nodes in this subtree, the block itself included
    pub fn node_count(&self) -> usize {
        1 + match self {
            Block::List(list) => list.nested_count(),
            Block::Table(table) => table
                .rows
                .iter()
                .map(|row| 1 + row.cells.len())
                .sum(),
            _ => 0,
        }
    }
}

impl List {
    pub fn new(list_type: ListType, items: Vec<ListItem>) -> Self {
        Self {
            list_type,
            items,
            attributes: Attributes::new(),
        }
    }

    fn nested_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| {
                1 + item
                    .children
                    .iter()
                    .map(|child| 1 + child.nested_count())
                    .sum::<usize>()
            })
            .sum()
    }
}

impl ListItem {
    pub fn new(content: Vec<TextSpan>) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }

    pub fn checked(content: Vec<TextSpan>, checked: bool) -> Self {
        Self {
            content,
            checked: Some(checked),
            ..Default::default()
        }
    }

    pub fn text(&self) -> String {
        spans_text(&self.content)
    }
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            attributes: Attributes::new(),
        }
    }
}

impl TableCell {
    pub fn new(content: Vec<TextSpan>) -> Self {
        Self {
            content,
            attributes: Attributes::new(),
        }
    }
}

/// A parsed Box Note
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    /// Source metadata such as revision, authors and timestamps
    pub metadata: IndexMap<String, Value>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            metadata: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Plain text of every top-level block and its direct children, one per line
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            lines.push(block.text());
            match block {
                Block::List(list) => lines.extend(list.items.iter().map(ListItem::text)),
                Block::Table(table) => lines.extend(table.rows.iter().map(|row| {
                    row.cells
                        .iter()
                        .map(|cell| spans_text(&cell.content))
                        .collect::<String>()
                })),
                _ => {}
            }
        }
        lines.join("\n")
    }

    /// Total number of nodes, nested items, rows and cells included
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(Block::node_count).sum()
    }
}
