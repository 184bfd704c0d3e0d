//! BoxnotesService - the main entry point for converting Box Notes.

use serde_json::Value;

use crate::detect::{detect_format, validate, FormatType};
use crate::parser::parser_for;
use crate::{
    Document, MarkdownOptions, MarkdownRenderer, OutputFormat, PlainTextOptions, PlainTextRenderer, Renderer,
    Result,
};

/// Options for BoxnotesService
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    /// Markdown renderer options
    pub markdown: MarkdownOptions,

    /// Plain text renderer options
    pub plain_text: PlainTextOptions,

    /// Skip detection and always use this parser
    pub force_format: Option<FormatType>,
}

/// Detects, parses and renders Box Notes
#[derive(Debug, Clone, Default)]
pub struct BoxnotesService {
    options: ServiceOptions,
}

impl BoxnotesService {
    /// Create a new BoxnotesService with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a BoxnotesService with custom options
    pub fn with_options(options: ServiceOptions) -> Self {
        Self { options }
    }

    /// Get the current options
    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut ServiceOptions {
        &mut self.options
    }

    /// The format `data` will be parsed as. A forced format is returned
    /// without looking at the data.
    pub fn detect(&self, data: &Value) -> Result<FormatType> {
        if let Some(format) = self.options.force_format {
            return Ok(format);
        }

        let format = detect_format(data)?;
        validate(format, data)?;
        tracing::debug!("Detected {} format", format);
        Ok(format)
    }

    /// Parse Box Notes JSON into a document
    pub fn parse(&self, data: &Value) -> Result<Document> {
        let format = self.detect(data)?;
        parser_for(format).parse(data)
    }

    /// Render an already parsed document
    pub fn render(&self, document: &Document, format: OutputFormat) -> Result<String> {
        let output = match format {
            OutputFormat::Markdown => MarkdownRenderer::with_options(self.options.markdown.clone()).render(document)?,
            OutputFormat::PlainText => {
                PlainTextRenderer::with_options(self.options.plain_text.clone()).render(document)?
            }
        };
        Ok(output)
    }

    /// Parse and render in one step
    pub fn convert(&self, data: &Value, format: OutputFormat) -> Result<String> {
        let document = self.parse(data)?;
        self.render(&document, format)
    }
}
