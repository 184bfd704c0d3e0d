//! Configuration options for rendering

use std::fmt;
use std::str::FromStr;

/// Options for Markdown rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Bullet list marker
    pub bullet_marker: char,

    /// Horizontal rule string
    pub hr: String,

    /// Fence string for code blocks
    pub fence: String,

    /// Indentation added per nesting level of lists
    pub list_indent: String,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            bullet_marker: '-',
            hr: "---".to_string(),
            fence: "```".to_string(),
            list_indent: "  ".to_string(),
        }
    }
}

/// Options for plain text rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextOptions {
    /// Bullet list marker
    pub bullet: char,

    /// Markers for checked and unchecked check list items
    pub checked_box: char,
    pub unchecked_box: char,

    /// Character and width of the horizontal rule
    pub rule_char: char,
    pub rule_width: usize,

    /// Indentation of code blocks and block quotes
    pub indent: String,

    /// Indentation added per nesting level of lists
    pub list_indent: String,
}

impl Default for PlainTextOptions {
    fn default() -> Self {
        Self {
            bullet: '•',
            checked_box: '☑',
            unchecked_box: '☐',
            rule_char: '-',
            rule_width: 60,
            indent: "    ".to_string(),
            list_indent: "  ".to_string(),
        }
    }
}

/// Target output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    PlainText,
}

impl OutputFormat {
    /// File extension conventionally used for this format, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::PlainText => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => f.write_str("markdown"),
            OutputFormat::PlainText => f.write_str("text"),
        }
    }
}

/// Error returned when an output format name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown output format: {0}")]
pub struct UnknownOutputFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownOutputFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "text" | "txt" | "plain" | "plaintext" => Ok(OutputFormat::PlainText),
            _ => Err(UnknownOutputFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("Markdown".parse(), Ok(OutputFormat::Markdown));
        assert_eq!("md".parse(), Ok(OutputFormat::Markdown));
        assert_eq!(" TXT ".parse(), Ok(OutputFormat::PlainText));
        assert_eq!(
            "html".parse::<OutputFormat>(),
            Err(UnknownOutputFormat("html".to_string()))
        );
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::PlainText.extension(), "txt");
        assert_eq!(OutputFormat::PlainText.to_string(), "text");
    }
}
