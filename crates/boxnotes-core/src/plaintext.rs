//! Plain text rendering
//!
//! Strips all markup and lays the document out for reading in a terminal or
//! a text editor.

use std::fmt::{self, Write};

use crate::model::{Block, Document, HeadingLevel, Image, List, ListType, Table, TextSpan};
use crate::options::PlainTextOptions;
use crate::render::{join_blocks, RenderError, Renderer};

/// Renders documents as plain text
#[derive(Debug, Clone, Default)]
pub struct PlainTextRenderer {
    options: PlainTextOptions,
}

impl PlainTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PlainTextOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PlainTextOptions {
        &self.options
    }
}

impl Renderer for PlainTextRenderer {
    fn render(&self, document: &Document) -> Result<String, RenderError> {
        let mut rendered = Vec::with_capacity(document.blocks.len());
        for block in &document.blocks {
            let mut out = String::new();
            write_block(block, &self.options, &mut out).map_err(RenderError::write("plain text"))?;
            rendered.push(out);
        }
        Ok(join_blocks(rendered))
    }
}

fn write_block(block: &Block, options: &PlainTextOptions, out: &mut String) -> fmt::Result {
    match block {
        Block::Paragraph { content, .. } => write_spans(content, out),

        Block::Heading { level, content, .. } => {
            let mut text = String::new();
            write_spans(content, &mut text)?;
            let underline = match level {
                HeadingLevel::H1 => '=',
                HeadingLevel::H2 => '-',
                HeadingLevel::H3 => '~',
            };
            let width = text.chars().count();
            write!(out, "{}\n{}", text, underline.to_string().repeat(width))
        }

        Block::CodeBlock { content, .. } => write_indented(content, &options.indent, out),

        Block::BlockQuote { content, .. } => {
            let prefix = format!("{}> ", options.indent);
            write_indented(content, &prefix, out)
        }

        Block::HorizontalRule { .. } => {
            out.push_str(&options.rule_char.to_string().repeat(options.rule_width));
            Ok(())
        }

        Block::List(list) => write_list(list, options, 0, out),

        Block::Table(table) => write_table(table, out),

        Block::Image(image) => write_image(image, out),
    }
}

fn write_indented(content: &[TextSpan], prefix: &str, out: &mut String) -> fmt::Result {
    let mut text = String::new();
    write_spans(content, &mut text)?;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write!(out, "{}{}", prefix, line)?;
    }
    Ok(())
}

fn write_list(list: &List, options: &PlainTextOptions, depth: usize, out: &mut String) -> fmt::Result {
    let indent = options.list_indent.repeat(depth);

    for (i, item) in list.items.iter().enumerate() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&indent);

        match list.list_type {
            ListType::Bullet => write!(out, "{} ", options.bullet)?,
            ListType::Ordered => write!(out, "{}. ", i + 1)?,
            ListType::Check => {
                let mark = if item.checked.unwrap_or(false) {
                    options.checked_box
                } else {
                    options.unchecked_box
                };
                write!(out, "{} ", mark)?;
            }
        }

        write_spans(&item.content, out)?;

        for child in &item.children {
            write_list(child, options, depth + 1, out)?;
        }
    }

    Ok(())
}

fn write_table(table: &Table, out: &mut String) -> fmt::Result {
    for (i, row) in table.rows.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }

        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            let mut text = String::new();
            write_spans(&cell.content, &mut text)?;
            cells.push(text.replace('\n', " "));
        }
        out.push_str(&cells.join("\t"));
    }

    Ok(())
}

fn write_image(image: &Image, out: &mut String) -> fmt::Result {
    let target = image
        .path
        .as_deref()
        .or(image.url.as_deref())
        .unwrap_or("");
    let alt = image.alt.as_deref().unwrap_or("image");
    write!(out, "[Image: {}] ({})", alt, target)
}

fn write_spans(spans: &[TextSpan], out: &mut String) -> fmt::Result {
    for span in spans {
        out.push_str(&span.text);
        if let Some(url) = &span.attributes.link {
            write!(out, " ({})", url)?;
        }
    }
    Ok(())
}
