//! The parser seam shared by both Box Notes generations.

use serde_json::Value;

use crate::{Document, FormatType, LegacyParser, ModernParser, Result};

/// Turns deserialized Box Notes JSON into a [`Document`].
///
/// Implementations assume the shape of their own generation and fail with
/// [`BoxnotesError::ParseError`](crate::BoxnotesError::ParseError) when
/// handed anything else.
pub trait DocumentParser {
    fn parse(&self, data: &Value) -> Result<Document>;
}

/// The parser for a detected (or forced) format
pub fn parser_for(format: FormatType) -> Box<dyn DocumentParser> {
    match format {
        FormatType::Legacy => Box::new(LegacyParser::new()),
        FormatType::Modern => Box::new(ModernParser::new()),
    }
}
