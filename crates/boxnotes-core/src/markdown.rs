//! Markdown rendering
//!
//! Converts the block tree into GitHub Flavored Markdown.

use std::fmt::{self, Write};

use crate::model::{Block, Document, Image, List, ListType, Table, TextSpan};
use crate::options::MarkdownOptions;
use crate::render::{join_blocks, RenderError, Renderer};

/// Characters escaped in plain runs of text
const SPECIAL_CHARS: &[char] = &['\\', '#', '*', '_', '[', ']', '(', ')', '`'];

/// Renders documents as Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MarkdownOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, document: &Document) -> Result<String, RenderError> {
        let mut rendered = Vec::with_capacity(document.blocks.len());
        for block in &document.blocks {
            let mut out = String::new();
            serialize_block(block, &self.options, &mut out).map_err(RenderError::write("markdown"))?;
            rendered.push(out);
        }
        Ok(join_blocks(rendered))
    }
}

fn serialize_block(block: &Block, options: &MarkdownOptions, out: &mut String) -> fmt::Result {
    match block {
        Block::Paragraph { content, .. } => serialize_spans(content, out),

        Block::Heading { level, content, .. } => {
            for _ in 0..level.get() {
                out.push('#');
            }
            out.push(' ');
            serialize_spans(content, out)
        }

        Block::CodeBlock { content, .. } => {
            writeln!(out, "{}", options.fence)?;
            for span in content {
                out.push_str(&span.text);
            }
            write!(out, "\n{}", options.fence)
        }

        Block::BlockQuote { content, .. } => {
            let mut text = String::new();
            serialize_spans(content, &mut text)?;
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                write!(out, "> {}", line)?;
            }
            Ok(())
        }

        Block::HorizontalRule { .. } => {
            out.push_str(&options.hr);
            Ok(())
        }

        Block::List(list) => serialize_list(list, options, 0, out),

        Block::Table(table) => serialize_table(table, out),

        Block::Image(image) => serialize_image(image, out),
    }
}

fn serialize_list(list: &List, options: &MarkdownOptions, depth: usize, out: &mut String) -> fmt::Result {
    let indent = options.list_indent.repeat(depth);

    for (i, item) in list.items.iter().enumerate() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&indent);

        match list.list_type {
            ListType::Bullet => write!(out, "{} ", options.bullet_marker)?,
            ListType::Ordered => write!(out, "{}. ", i + 1)?,
            ListType::Check => {
                let mark = if item.checked.unwrap_or(false) { 'x' } else { ' ' };
                write!(out, "{} [{}] ", options.bullet_marker, mark)?;
            }
        }

        serialize_spans(&item.content, out)?;

        for child in &item.children {
            serialize_list(child, options, depth + 1, out)?;
        }
    }

    Ok(())
}

fn serialize_table(table: &Table, out: &mut String) -> fmt::Result {
    for (i, row) in table.rows.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }

        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            let mut text = String::new();
            serialize_spans(&cell.content, &mut text)?;
            cells.push(text.replace('|', "\\|"));
        }
        write!(out, "| {} |", cells.join(" | "))?;

        // GFM needs a delimiter row after the header row
        if i == 0 {
            let separator = vec!["---"; cells.len()];
            write!(out, "\n| {} |", separator.join(" | "))?;
        }
    }

    Ok(())
}

fn serialize_image(image: &Image, out: &mut String) -> fmt::Result {
    let alt = image.alt.as_deref().unwrap_or("");
    let target = image
        .path
        .as_deref()
        .or(image.url.as_deref())
        .unwrap_or("");

    write!(out, "![{}]({}", alt, target)?;
    if let Some(title) = &image.title {
        write!(out, " \"{}\"", title)?;
    }
    out.push(')');
    Ok(())
}

fn serialize_spans(spans: &[TextSpan], out: &mut String) -> fmt::Result {
    for span in spans {
        serialize_span(span, out)?;
    }
    Ok(())
}

fn serialize_span(span: &TextSpan, out: &mut String) -> fmt::Result {
    let attrs = &span.attributes;

    let mut text = match (attrs.bold, attrs.italic) {
        (true, true) => format!("***{}***", span.text),
        (true, false) => format!("**{}**", span.text),
        (false, true) => format!("*{}*", span.text),
        (false, false) => span.text.clone(),
    };

    if attrs.code {
        text = format!("`{}`", text);
    }

    if attrs.strike {
        text = format!("~~{}~~", text);
    }

    if let Some(url) = &attrs.link {
        text = format!("[{}]({})", text.replace(']', "\\]"), url);
    }

    if !attrs.code && attrs.link.is_none() {
        text = escape_markdown(&text);
    }

    out.write_str(&text)
}

/// Escape Markdown metacharacters in a run of text.
///
/// Runs that already start with emphasis or code delimiters are left alone.
/// Each metacharacter gets a backslash unless one already precedes it; the
/// backslash itself is handled first, so `\*` becomes `\\*`.
pub fn escape_markdown(text: &str) -> String {
    if text.starts_with('*') || text.starts_with('`') {
        return text.to_string();
    }

    SPECIAL_CHARS
        .iter()
        .fold(text.to_string(), |escaped, &special| escape_char(&escaped, special))
}

/// Prefix every `special` that is not already preceded by a backslash
fn escape_char(text: &str, special: char) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous = None;

    for c in text.chars() {
        if c == special && previous != Some('\\') {
            result.push('\\');
        }
        result.push(c);
        previous = Some(c);
    }

    result
}
