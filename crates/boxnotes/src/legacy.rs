//! Parser for legacy Box Notes (the `atext` format).
//!
//! The attribute string is decoded into `(text, attributes)` spans by
//! [`crate::attribs`]; this module folds that flat stream into blocks.
//! Line breaks close the block being built. A span whose attributes imply a
//! different block kind than the one being accumulated closes it as well.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::attribs::{extract_text_spans, parse_attribute_string, AttributePool, RawAttribute, RawSpan};
use crate::parser::DocumentParser;
use crate::{
    Attributes, Block, BlockType, BoxnotesError, Document, FormatType, HeadingLevel, List, ListItem,
    ListType, Result, TextAttributes, TextSpan,
};

static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^h[0-9]+$").unwrap());

/// Top-level keys copied into document metadata, with their new names
const METADATA_KEYS: [(&str, &str); 3] = [
    ("head", "revision"),
    ("lastEditTimestamp", "last_edit"),
    ("authorList", "authors"),
];

/// Parser for notes created before August 2022
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyParser;

impl LegacyParser {
    pub fn new() -> Self {
        Self
    }

    /// Fold decoded spans into top-level blocks
    pub fn build_blocks(&self, spans: Vec<RawSpan>) -> Vec<Block> {
        let mut builder = BlockBuilder::default();
        for span in spans {
            builder.push(span);
        }
        builder.finish()
    }
}

impl DocumentParser for LegacyParser {
    fn parse(&self, data: &Value) -> Result<Document> {
        let fail = |reason: String| BoxnotesError::parse(FormatType::Legacy, reason);

        let atext = data
            .get("atext")
            .ok_or_else(|| fail("missing 'atext' field".to_string()))?
            .as_object()
            .ok_or_else(|| fail("'atext' is not an object".to_string()))?;

        let text = string_field(atext, "text").map_err(fail)?;
        let attribs = string_field(atext, "attribs").map_err(fail)?;

        let pool = atext
            .get("pool")
            .or_else(|| data.get("pool"))
            .map(AttributePool::from_json)
            .unwrap_or_default();

        let chunks = parse_attribute_string(attribs);
        let spans = extract_text_spans(text, &chunks, &pool);
        tracing::debug!(
            "Decoded {} chunks into {} spans ({} pool entries)",
            chunks.len(),
            spans.len(),
            pool.len()
        );

        let mut document = Document::new(self.build_blocks(spans));
        for (source, target) in METADATA_KEYS {
            if let Some(value) = data.get(source) {
                document.metadata.insert(target.to_string(), value.clone());
            }
        }

        tracing::debug!("Built {} legacy blocks", document.blocks.len());
        Ok(document)
    }
}

/// A missing field reads as empty; a present one must be a string
fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> std::result::Result<&'a str, String> {
    match object.get(key) {
        None => Ok(""),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(format!("'atext.{}' is not a string", key)),
    }
}

/// Accumulator for the block currently being built
struct BlockBuilder {
    blocks: Vec<Block>,
    block_type: BlockType,
    content: Vec<TextSpan>,
    attributes: Attributes,
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            block_type: BlockType::Paragraph,
            content: Vec::new(),
            attributes: Attributes::new(),
        }
    }
}

impl BlockBuilder {
    fn push(&mut self, span: RawSpan) {
        if let Some(rest) = span.text.strip_prefix('\n') {
            if !self.content.is_empty() {
                self.flush();
                self.block_type = BlockType::Paragraph;
                self.attributes = Attributes::new();
            }

            // Whatever follows the first break opens the next block
            if !rest.is_empty() {
                self.content
                    .push(TextSpan::new(rest, text_attributes(&span.attributes)));
            }
            return;
        }

        if !span.attributes.is_empty() {
            let block_type = detect_block_type(&span.attributes);
            if block_type != self.block_type && !self.content.is_empty() {
                self.flush();
            }
            self.block_type = block_type;
            self.attributes = block_attributes(&span.attributes);
        }

        if !span.text.is_empty() {
            let attributes = text_attributes(&span.attributes);
            self.content.push(TextSpan::new(span.text, attributes));
        }
    }

    /// Emit the accumulated block, if it has any content
    fn flush(&mut self) {
        let content = std::mem::take(&mut self.content);
        let attributes = std::mem::take(&mut self.attributes);
        if content.is_empty() {
            return;
        }

        let block = match self.block_type {
            BlockType::Heading => Block::Heading {
                level: heading_level(&attributes),
                content,
                attributes,
            },
            BlockType::List => Block::List(List {
                list_type: list_type(&attributes),
                items: vec![ListItem::new(content)],
                attributes,
            }),
            BlockType::CodeBlock => Block::CodeBlock { content, attributes },
            BlockType::BlockQuote => Block::BlockQuote { content, attributes },
            _ => Block::Paragraph { content, attributes },
        };
        self.blocks.push(block);
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn block_attributes(attributes: &[RawAttribute]) -> Attributes {
    attributes
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect()
}

/// Guess the block kind from attribute names. The first attribute (in pool
/// order) that names a kind decides.
pub(crate) fn detect_block_type(attributes: &[RawAttribute]) -> BlockType {
    for (name, _) in attributes {
        let name = name.to_lowercase();

        if name.contains("heading") || NUMBERED_HEADING.is_match(&name) {
            return BlockType::Heading;
        }
        if name.contains("list") {
            return BlockType::List;
        }
        if name.contains("code") {
            return BlockType::CodeBlock;
        }
        if name.contains("quote") {
            return BlockType::BlockQuote;
        }
    }

    BlockType::Paragraph
}

/// First digit 1-3 in the value, then the name, of a heading-like attribute
fn heading_level(attributes: &Attributes) -> HeadingLevel {
    for (name, value) in attributes {
        let name = name.to_lowercase();
        if !(name.contains("heading") || name.starts_with('h')) {
            continue;
        }

        let value = value_text(value).to_lowercase();
        let level = value
            .chars()
            .chain(name.chars())
            .filter_map(|c| c.to_digit(10))
            .find_map(|digit| HeadingLevel::new(u64::from(digit)));
        if let Some(level) = level {
            return level;
        }
    }

    HeadingLevel::H1
}

fn list_type(attributes: &Attributes) -> ListType {
    for (name, value) in attributes {
        if !name.to_lowercase().contains("list") {
            continue;
        }

        let value = value_text(value).to_lowercase();
        if value.contains("bullet") || value.contains("unordered") {
            return ListType::Bullet;
        } else if value.contains("number") || value.contains("ordered") {
            return ListType::Ordered;
        } else if value.contains("check") || value.contains("task") {
            return ListType::Check;
        }
    }

    ListType::Bullet
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Inline formatting property an attribute name maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Bold,
    Italic,
    Code,
    Underline,
    Strike,
    Link,
    Color,
    Size,
    Highlight,
}

impl Property {
    fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let property = match name.as_str() {
            "bold" | "b" => Property::Bold,
            "italic" | "i" => Property::Italic,
            "code" => Property::Code,
            "underline" | "u" => Property::Underline,
            "strike" | "strikethrough" => Property::Strike,
            "link" | "url" => Property::Link,
            _ if name.contains("color") => Property::Color,
            _ if name.contains("size") => Property::Size,
            _ if name.contains("highlight") || name.contains("background") => Property::Highlight,
            _ => return None,
        };
        Some(property)
    }
}

/// Map raw pool attributes to inline formatting. When several attributes
/// target the same property, the first one wins.
pub(crate) fn text_attributes(attributes: &[RawAttribute]) -> TextAttributes {
    let mut bold = None;
    let mut italic = None;
    let mut code = None;
    let mut underline = None;
    let mut strike = None;
    let mut link = None;
    let mut color = None;
    let mut size = None;
    let mut highlight = None;

    for (name, value) in attributes {
        let Some(property) = Property::from_name(name) else {
            continue;
        };
        let enabled = value.eq_ignore_ascii_case("true");

        match property {
            Property::Bold => {
                bold.get_or_insert(enabled);
            }
            Property::Italic => {
                italic.get_or_insert(enabled);
            }
            Property::Code => {
                code.get_or_insert(enabled);
            }
            Property::Underline => {
                underline.get_or_insert(enabled);
            }
            Property::Strike => {
                strike.get_or_insert(enabled);
            }
            Property::Link => {
                link.get_or_insert_with(|| value.clone());
            }
            Property::Color => {
                color.get_or_insert_with(|| value.clone());
            }
            Property::Size => {
                size.get_or_insert_with(|| value.clone());
            }
            Property::Highlight => {
                highlight.get_or_insert_with(|| value.clone());
            }
        }
    }

    TextAttributes {
        bold: bold.unwrap_or(false),
        italic: italic.unwrap_or(false),
        code: code.unwrap_or(false),
        underline: underline.unwrap_or(false),
        strike: strike.unwrap_or(false),
        link,
        color,
        size,
        highlight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attr(name: &str, value: &str) -> RawAttribute {
        (name.to_string(), value.to_string())
    }

    fn bold() -> TextAttributes {
        TextAttributes {
            bold: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_detect_block_type() {
        assert_eq!(detect_block_type(&[attr("heading", "h1")]), BlockType::Heading);
        assert_eq!(detect_block_type(&[attr("H2", "true")]), BlockType::Heading);
        assert_eq!(detect_block_type(&[attr("list", "bullet1")]), BlockType::List);
        assert_eq!(detect_block_type(&[attr("code", "true")]), BlockType::CodeBlock);
        assert_eq!(detect_block_type(&[attr("blockquote", "true")]), BlockType::BlockQuote);
        assert_eq!(detect_block_type(&[attr("bold", "true")]), BlockType::Paragraph);
        assert_eq!(detect_block_type(&[attr("highlight", "yes")]), BlockType::Paragraph);
        assert_eq!(detect_block_type(&[]), BlockType::Paragraph);
    }

    #[test]
    fn test_detect_block_type_first_match_wins() {
        let attributes = [attr("bold", "true"), attr("list", "bullet1"), attr("heading", "h1")];
        assert_eq!(detect_block_type(&attributes), BlockType::List);
    }

    #[test]
    fn test_heading_level() {
        let level = |name: &str, value: &str| heading_level(&block_attributes(&[attr(name, value)]));

        assert_eq!(level("heading", "h2"), HeadingLevel::H2);
        assert_eq!(level("h3", "true"), HeadingLevel::H3);
        assert_eq!(level("heading", "h5"), HeadingLevel::H1);
        assert_eq!(level("heading", "big"), HeadingLevel::H1);
        // value digits are scanned before name digits
        assert_eq!(level("h1", "2"), HeadingLevel::H2);
    }

    #[test]
    fn test_list_type() {
        let kind = |value: &str| list_type(&block_attributes(&[attr("list", value)]));

        assert_eq!(kind("bullet1"), ListType::Bullet);
        assert_eq!(kind("unordered"), ListType::Bullet);
        assert_eq!(kind("number1"), ListType::Ordered);
        assert_eq!(kind("ordered"), ListType::Ordered);
        assert_eq!(kind("checked"), ListType::Check);
        assert_eq!(kind("task"), ListType::Check);
        assert_eq!(kind("other"), ListType::Bullet);
    }

    #[test]
    fn test_text_attributes_mapping() {
        let attributes = text_attributes(&[
            attr("bold", "TRUE"),
            attr("i", "true"),
            attr("u", "false"),
            attr("strikethrough", "true"),
            attr("url", "https://box.com"),
            attr("font-color", "red"),
            attr("font-size", "12"),
            attr("background", "yellow"),
        ]);

        assert_eq!(
            attributes,
            TextAttributes {
                bold: true,
                italic: true,
                code: false,
                underline: false,
                strike: true,
                link: Some("https://box.com".to_string()),
                color: Some("red".to_string()),
                size: Some("12".to_string()),
                highlight: Some("yellow".to_string()),
            }
        );
    }

    #[test]
    fn test_text_attributes_first_wins() {
        let attributes = text_attributes(&[
            attr("bold", "false"),
            attr("b", "true"),
            attr("color", "red"),
            attr("font-color", "blue"),
        ]);
        assert!(!attributes.bold);
        assert_eq!(attributes.color.as_deref(), Some("red"));
        assert!(text_attributes(&[attr("heading", "h1"), attr("list", "bullet")]).is_empty());
    }

    #[test]
    fn test_linebreak_splits_paragraphs() {
        let parser = LegacyParser::new();
        let blocks = parser.build_blocks(vec![
            RawSpan::new("Hello", vec![attr("bold", "true")]),
            RawSpan::new("\n", vec![]),
            RawSpan::new("or", vec![]),
        ]);

        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    content: vec![TextSpan::new("Hello", bold())],
                    attributes: block_attributes(&[attr("bold", "true")]),
                },
                Block::paragraph(vec![TextSpan::plain("or")]),
            ]
        );
    }

    #[test]
    fn test_type_change_starts_new_block() {
        let blocks = LegacyParser::new().build_blocks(vec![
            RawSpan::new("Intro", vec![]),
            RawSpan::new("item", vec![attr("list", "number1")]),
        ]);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "Intro");
        match &blocks[1] {
            Block::List(list) => {
                assert_eq!(list.list_type, ListType::Ordered);
                assert_eq!(list.items.len(), 1);
                assert_eq!(list.items[0].text(), "item");
                assert_eq!(list.attributes["list"], "number1");
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_same_type_keeps_accumulating() {
        let blocks = LegacyParser::new().build_blocks(vec![
            RawSpan::new("Big ", vec![attr("heading", "h2")]),
            RawSpan::new("Title", vec![attr("heading", "h2"), attr("italic", "true")]),
            RawSpan::new("\n", vec![]),
        ]);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block_type(), BlockType::Heading);
        assert_eq!(blocks[0].text(), "Big Title");
        assert!(blocks[0].content()[1].attributes.italic);
    }

    #[test]
    fn test_plain_span_joins_current_block() {
        // Spans without attributes never change the block kind
        let blocks = LegacyParser::new().build_blocks(vec![
            RawSpan::new("Head", vec![attr("heading", "h1")]),
            RawSpan::new("ing", vec![]),
        ]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "Heading");
    }

    #[test]
    fn test_leading_newline_remainder_starts_next_block() {
        let blocks = LegacyParser::new().build_blocks(vec![
            RawSpan::new("One", vec![]),
            RawSpan::new("\n\nTwo", vec![attr("bold", "true")]),
        ]);

        assert_eq!(
            blocks,
            vec![
                Block::paragraph(vec![TextSpan::plain("One")]),
                Block::paragraph(vec![TextSpan::new("\nTwo", bold())]),
            ]
        );
    }

    #[test]
    fn test_blank_line_run_keeps_extra_breaks() {
        // "|2" decodes to a single "\n\n" span: one break closes the block,
        // the other is carried into the next one
        let blocks = LegacyParser::new().build_blocks(vec![
            RawSpan::new("One", vec![]),
            RawSpan::new("\n\n", vec![]),
            RawSpan::new("Two", vec![]),
        ]);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "One");
        assert_eq!(
            blocks[1].content(),
            &[TextSpan::plain("\n"), TextSpan::plain("Two")]
        );
        assert_eq!(blocks[1].text(), "\nTwo");
    }

    #[test]
    fn test_carried_break_is_emitted_as_paragraph() {
        let blocks = LegacyParser::new().build_blocks(vec![
            RawSpan::new("One", vec![]),
            RawSpan::new("\n\n", vec![]),
            RawSpan::new("\n", vec![]),
        ]);

        assert_eq!(
            blocks,
            vec![
                Block::paragraph(vec![TextSpan::plain("One")]),
                Block::paragraph(vec![TextSpan::plain("\n")]),
            ]
        );
    }

    #[test]
    fn test_empty_blocks_are_not_emitted() {
        let blocks = LegacyParser::new().build_blocks(vec![
            RawSpan::new("\n", vec![]),
            RawSpan::new("", vec![attr("heading", "h1")]),
            RawSpan::new("\n", vec![]),
            RawSpan::new("\n", vec![]),
        ]);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_parse_document() {
        let data = json!({
            "atext": {
                "text": "Title\nBody text\n",
                "attribs": "*0+5|1*1+4+5|1",
                "pool": {
                    "numToAttrib": {
                        "0": ["heading", "h2"],
                        "1": ["bold", "true"]
                    }
                }
            },
            "head": 42,
            "lastEditTimestamp": 1_650_000_000_000u64,
            "authorList": ["alice"]
        });

        let document = LegacyParser::new().parse(&data).unwrap();

        assert_eq!(document.blocks.len(), 2);
        assert!(matches!(
            &document.blocks[0],
            Block::Heading { level: HeadingLevel::H2, .. }
        ));
        assert_eq!(document.blocks[0].text(), "Title");
        assert_eq!(
            document.blocks[1].content(),
            &[TextSpan::new("Body", bold()), TextSpan::plain(" text")]
        );

        assert_eq!(document.metadata["revision"], json!(42));
        assert_eq!(document.metadata["last_edit"], json!(1_650_000_000_000u64));
        assert_eq!(document.metadata["authors"], json!(["alice"]));
        let keys: Vec<&str> = document.metadata.keys().map(String::as_str).collect();
        assert_eq!(keys, ["revision", "last_edit", "authors"]);
    }

    #[test]
    fn test_parse_top_level_pool_fallback() {
        let data = json!({
            "atext": {"text": "Hi\n", "attribs": "*0+2|1"},
            "pool": {"numToAttrib": {"0": ["italic", "true"]}}
        });
        let document = LegacyParser::new().parse(&data).unwrap();
        assert!(document.blocks[0].content()[0].attributes.italic);
    }

    #[test]
    fn test_parse_missing_fields_read_as_empty() {
        let document = LegacyParser::new().parse(&json!({"atext": {}})).unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        let message = |data: Value| match LegacyParser::new().parse(&data) {
            Err(err @ BoxnotesError::ParseError { format: FormatType::Legacy, .. }) => err.to_string(),
            other => panic!("expected a legacy parse error, got {:?}", other),
        };

        assert_eq!(
            message(json!({"doc": {}})),
            "failed to parse legacy-format document: missing 'atext' field"
        );
        assert!(message(json!({"atext": "x"})).contains("'atext' is not an object"));
        assert!(message(json!({"atext": {"text": 5, "attribs": ""}})).contains("'atext.text' is not a string"));
        assert!(message(json!({"atext": {"text": "", "attribs": []}})).contains("'atext.attribs' is not a string"));
    }
}
