//! Parser for modern Box Notes (the ProseMirror-style `doc` tree).

use serde::Deserialize;
use serde_json::Value;

use crate::parser::DocumentParser;
use crate::utilities::{describe, scalar_string};
use crate::{
    Attributes, Block, BoxnotesError, Document, FormatType, HeadingLevel, Image, List, ListItem, ListType,
    Result, Table, TableCell, TableRow, TextAttributes, TextSpan,
};

/// Top-level keys copied into document metadata, with their new names
const METADATA_KEYS: [(&str, &str); 3] = [
    ("version", "version"),
    ("schema_version", "schema_version"),
    ("last_edit_timestamp", "last_edit"),
];

/// One node of the document tree. Every field is optional in the export.
#[derive(Debug, Default, Deserialize)]
struct Node {
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<Vec<Node>>,
    attrs: Option<Attributes>,
    text: Option<String>,
    marks: Option<Vec<Mark>>,
}

/// Inline formatting attached to a text node
#[derive(Debug, Default, Deserialize)]
struct Mark {
    #[serde(rename = "type")]
    kind: Option<String>,
    attrs: Option<Attributes>,
}

impl Node {
    fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or_default()
    }

    fn children(&self) -> &[Node] {
        self.content.as_deref().unwrap_or_default()
    }

    fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref()?.get(key)
    }

    fn attributes(&self) -> Attributes {
        self.attrs.clone().unwrap_or_default()
    }

    fn paragraphs(&self) -> impl Iterator<Item = &Node> {
        self.children().iter().filter(|child| child.kind() == "paragraph")
    }
}

impl Mark {
    fn attr(&self, key: &str) -> Option<String> {
        self.attrs.as_ref()?.get(key).and_then(scalar_string)
    }
}

/// Parser for notes created from August 2022 on
#[derive(Debug, Clone, Copy, Default)]
pub struct ModernParser;

impl ModernParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for ModernParser {
    fn parse(&self, data: &Value) -> Result<Document> {
        let fail = |reason: String| BoxnotesError::parse(FormatType::Modern, reason);

        // Both {"doc": {...}} and a bare doc node are accepted
        let doc = data.get("doc").unwrap_or(data);

        let kind = doc.get("type");
        if kind.and_then(Value::as_str) != Some("doc") {
            return Err(fail(format!("expected doc type, got {}", describe(kind))));
        }

        let nodes = match doc.get("content") {
            None | Some(Value::Null) => Vec::new(),
            Some(content) => Vec::<Node>::deserialize(content).map_err(|err| fail(err.to_string()))?,
        };

        let mut document = Document::new(nodes.iter().filter_map(block).collect());
        for (source, target) in METADATA_KEYS {
            if let Some(value) = data.get(source) {
                document.metadata.insert(target.to_string(), value.clone());
            }
        }

        tracing::debug!("Parsed {} modern nodes into {} blocks", nodes.len(), document.blocks.len());
        Ok(document)
    }
}

fn list_type(kind: &str) -> Option<ListType> {
    match kind {
        "bullet_list" => Some(ListType::Bullet),
        "ordered_list" => Some(ListType::Ordered),
        "check_list" => Some(ListType::Check),
        _ => None,
    }
}

fn block(node: &Node) -> Option<Block> {
    let block = match node.kind() {
        "paragraph" => Block::Paragraph {
            content: inline_content(node.children()),
            attributes: node.attributes(),
        },
        "heading" => Block::Heading {
            level: node
                .attr("level")
                .and_then(Value::as_u64)
                .map_or(HeadingLevel::H1, HeadingLevel::clamped),
            content: inline_content(node.children()),
            attributes: node.attributes(),
        },
        "code_block" => Block::CodeBlock {
            content: inline_content(node.children()),
            attributes: node.attributes(),
        },
        "blockquote" => Block::BlockQuote {
            content: quote_content(node),
            attributes: node.attributes(),
        },
        "horizontal_rule" => Block::HorizontalRule {
            attributes: node.attributes(),
        },
        "table" => Block::Table(table(node)),
        "image" => Block::Image(image(node)),
        "" => return None,
        kind => match list_type(kind) {
            Some(list_type) => Block::List(list(node, list_type)),
            None => {
                tracing::debug!("Skipping unsupported node type {:?}", kind);
                return None;
            }
        },
    };

    Some(block)
}

/// Quotes wrap their text in paragraphs; one line per paragraph
fn quote_content(node: &Node) -> Vec<TextSpan> {
    let mut spans = inline_content(node.children());
    for paragraph in node.paragraphs() {
        if !spans.is_empty() {
            spans.push(TextSpan::plain("\n"));
        }
        spans.extend(inline_content(paragraph.children()));
    }
    spans
}

/// Text of the paragraphs directly below a list item or table cell
fn paragraph_content(node: &Node) -> Vec<TextSpan> {
    node.paragraphs()
        .flat_map(|paragraph| inline_content(paragraph.children()))
        .collect()
}

fn list(node: &Node, list_type: ListType) -> List {
    let items = node
        .children()
        .iter()
        .filter(|child| matches!(child.kind(), "list_item" | "check_list_item"))
        .map(list_item)
        .collect();

    List {
        list_type,
        items,
        attributes: node.attributes(),
    }
}

fn list_item(node: &Node) -> ListItem {
    let children = node
        .children()
        .iter()
        .filter_map(|child| list_type(child.kind()).map(|list_type| list(child, list_type)))
        .collect();

    let checked = (node.kind() == "check_list_item")
        .then(|| node.attr("checked").and_then(Value::as_bool).unwrap_or(false));

    ListItem {
        content: paragraph_content(node),
        children,
        checked,
        attributes: node.attributes(),
    }
}

fn table(node: &Node) -> Table {
    let rows = node
        .children()
        .iter()
        .filter(|child| child.kind() == "table_row")
        .map(|row| TableRow {
            cells: row
                .children()
                .iter()
                .filter(|cell| matches!(cell.kind(), "table_cell" | "table_header"))
                .map(|cell| TableCell {
                    content: paragraph_content(cell),
                    attributes: cell.attributes(),
                })
                .collect(),
            attributes: row.attributes(),
        })
        .collect();

    Table {
        rows,
        attributes: node.attributes(),
    }
}

fn image(node: &Node) -> Image {
    let field = |key: &str| node.attr(key).and_then(scalar_string);
    Image {
        url: field("src"),
        path: None,
        alt: field("alt"),
        title: field("title"),
        attributes: node.attributes(),
    }
}

fn inline_content(nodes: &[Node]) -> Vec<TextSpan> {
    nodes
        .iter()
        .filter_map(|node| match node.kind() {
            "text" => node
                .text
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(|text| TextSpan::new(text, mark_attributes(node.marks.as_deref().unwrap_or_default()))),
            "hard_break" => Some(TextSpan::plain("\n")),
            _ => None,
        })
        .collect()
}

/// Later marks of the same kind overwrite earlier ones
fn mark_attributes(marks: &[Mark]) -> TextAttributes {
    let mut attributes = TextAttributes::default();

    for mark in marks {
        match mark.kind.as_deref().unwrap_or_default() {
            "strong" | "bold" => attributes.bold = true,
            "em" | "italic" => attributes.italic = true,
            "code" => attributes.code = true,
            "underline" => attributes.underline = true,
            "strike" | "strikethrough" => attributes.strike = true,
            "link" => attributes.link = mark.attr("href"),
            "font_color" => attributes.color = mark.attr("color"),
            "font_size" => attributes.size = mark.attr("size"),
            "highlight" => attributes.highlight = mark.attr("color"),
            _ => {}
        }
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(data: Value) -> Document {
        ModernParser::new().parse(&data).unwrap()
    }

    fn doc(content: Value) -> Value {
        json!({"doc": {"type": "doc", "content": content}})
    }

    fn text(text: &str) -> Value {
        json!({"type": "text", "text": text})
    }

    fn paragraph(text_value: &str) -> Value {
        json!({"type": "paragraph", "content": [text(text_value)]})
    }

    #[test]
    fn test_paragraph_and_heading() {
        let document = parse(doc(json!([
            {"type": "heading", "attrs": {"level": 2}, "content": [text("Sub")]},
            paragraph("Body"),
        ])));

        assert_eq!(
            document.blocks,
            vec![
                Block::Heading {
                    level: HeadingLevel::H2,
                    content: vec![TextSpan::plain("Sub")],
                    attributes: json!({"level": 2}).as_object().cloned().unwrap(),
                },
                Block::paragraph(vec![TextSpan::plain("Body")]),
            ]
        );
    }

    #[test]
    fn test_heading_level_out_of_range() {
        let document = parse(doc(json!([
            {"type": "heading", "attrs": {"level": 6}, "content": [text("Deep")]},
            {"type": "heading", "content": [text("Bare")]},
        ])));

        for block in &document.blocks {
            assert!(matches!(block, Block::Heading { level: HeadingLevel::H1, .. }));
        }
    }

    #[test]
    fn test_marks() {
        let document = parse(doc(json!([{
            "type": "paragraph",
            "content": [
                {"type": "text", "text": "styled", "marks": [
                    {"type": "strong"},
                    {"type": "em"},
                    {"type": "strikethrough"},
                    {"type": "underline"},
                    {"type": "link", "attrs": {"href": "https://box.com"}},
                    {"type": "font_color", "attrs": {"color": "#ff0000"}},
                    {"type": "font_size", "attrs": {"size": 14}},
                    {"type": "highlight", "attrs": {"color": "yellow"}},
                    {"type": "unknown_mark"}
                ]},
                {"type": "text", "text": "", "marks": [{"type": "bold"}]},
                {"type": "hard_break"},
                {"type": "text", "text": "x", "marks": [{"type": "code"}]}
            ]
        }])));

        let content = document.blocks[0].content();
        assert_eq!(content.len(), 3);
        assert_eq!(
            content[0].attributes,
            TextAttributes {
                bold: true,
                italic: true,
                code: false,
                underline: true,
                strike: true,
                link: Some("https://box.com".to_string()),
                color: Some("#ff0000".to_string()),
                size: Some("14".to_string()),
                highlight: Some("yellow".to_string()),
            }
        );
        assert_eq!(content[1], TextSpan::plain("\n"));
        assert!(content[2].attributes.code);
    }

    #[test]
    fn test_lists() {
        let document = parse(doc(json!([
            {"type": "bullet_list", "content": [
                {"type": "list_item", "content": [
                    paragraph("outer"),
                    {"type": "ordered_list", "content": [
                        {"type": "list_item", "content": [paragraph("inner")]}
                    ]}
                ]},
                {"type": "paragraph", "content": [text("not an item")]}
            ]},
            {"type": "check_list", "content": [
                {"type": "check_list_item", "attrs": {"checked": true}, "content": [paragraph("Done")]},
                {"type": "check_list_item", "content": [paragraph("Todo")]}
            ]}
        ])));

        let Block::List(bullets) = &document.blocks[0] else {
            panic!("expected a list");
        };
        assert_eq!(bullets.list_type, ListType::Bullet);
        assert_eq!(bullets.items.len(), 1);
        assert_eq!(bullets.items[0].text(), "outer");
        assert_eq!(bullets.items[0].checked, None);
        assert_eq!(bullets.items[0].children[0].list_type, ListType::Ordered);
        assert_eq!(bullets.items[0].children[0].items[0].text(), "inner");

        let Block::List(checks) = &document.blocks[1] else {
            panic!("expected a list");
        };
        assert_eq!(checks.list_type, ListType::Check);
        assert_eq!(checks.items[0].checked, Some(true));
        assert_eq!(checks.items[1].checked, Some(false));
    }

    #[test]
    fn test_table() {
        let document = parse(doc(json!([{
            "type": "table",
            "content": [
                {"type": "table_row", "content": [
                    {"type": "table_header", "content": [paragraph("A")]},
                    {"type": "table_header", "content": [paragraph("B")]}
                ]},
                {"type": "table_row", "content": [
                    {"type": "table_cell", "content": [paragraph("1"), paragraph("2")]},
                    {"type": "table_cell", "content": []}
                ]}
            ]
        }])));

        let Block::Table(table) = &document.blocks[0] else {
            panic!("expected a table");
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[1].content, vec![TextSpan::plain("B")]);
        assert_eq!(
            table.rows[1].cells[0].content,
            vec![TextSpan::plain("1"), TextSpan::plain("2")]
        );
        assert!(table.rows[1].cells[1].content.is_empty());
    }

    #[test]
    fn test_blockquote_code_rule_image() {
        let document = parse(doc(json!([
            {"type": "blockquote", "content": [paragraph("one"), paragraph("two")]},
            {"type": "code_block", "attrs": {"language": "rust"}, "content": [text("let x = 1;")]},
            {"type": "horizontal_rule"},
            {"type": "image", "attrs": {"src": "https://example.com/a.png", "alt": "A", "title": null}}
        ])));

        assert_eq!(document.blocks[0].text(), "one\ntwo");
        assert_eq!(document.blocks[1].text(), "let x = 1;");
        assert_eq!(document.blocks[1].attributes()["language"], "rust");
        assert_eq!(document.blocks[2], Block::horizontal_rule());
        match &document.blocks[3] {
            Block::Image(image) => {
                assert_eq!(image.url.as_deref(), Some("https://example.com/a.png"));
                assert_eq!(image.alt.as_deref(), Some("A"));
                assert_eq!(image.title, None);
            }
            other => panic!("expected an image, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_nodes_are_skipped() {
        let document = parse(doc(json!([
            {"type": "mystery", "content": [paragraph("hidden")]},
            {"content": []},
            paragraph("shown")
        ])));
        assert_eq!(document.blocks, vec![Block::paragraph(vec![TextSpan::plain("shown")])]);
    }

    #[test]
    fn test_bare_doc_and_metadata() {
        let document = parse(json!({
            "type": "doc",
            "content": [paragraph("Hi")],
            "version": 3,
            "schema_version": "1.0",
            "last_edit_timestamp": 1_700_000_000
        }));

        assert_eq!(document.text(), "Hi");
        assert_eq!(document.metadata["version"], json!(3));
        assert_eq!(document.metadata["schema_version"], json!("1.0"));
        assert_eq!(document.metadata["last_edit"], json!(1_700_000_000));
    }

    #[test]
    fn test_parse_errors() {
        let message = |data: Value| match ModernParser::new().parse(&data) {
            Err(err @ BoxnotesError::ParseError { format: FormatType::Modern, .. }) => err.to_string(),
            other => panic!("expected a modern parse error, got {:?}", other),
        };

        assert_eq!(
            message(json!({"doc": {"type": "paragraph"}})),
            "failed to parse modern-format document: expected doc type, got \"paragraph\""
        );
        assert!(message(json!({"atext": {}})).contains("got none"));
        assert!(message(doc(json!("oops"))).contains("invalid type"));
        assert!(message(doc(json!([{"type": 5}]))).contains("invalid type"));
    }
}
