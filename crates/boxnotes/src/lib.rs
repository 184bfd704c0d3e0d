//! # boxnotes
//!
//! Convert Box Notes JSON exports to Markdown or plain text.
//!
//! Box Notes come in two generations. Legacy notes (created before August
//! 2022) keep their text in an `atext` object whose formatting is a
//! run-length encoded attribute string over an attribute pool. Modern notes
//! carry a typed node tree under `doc`. Both are parsed into the shared block
//! tree from [`boxnotes_core`] and rendered from there.
//!
//! ## Design
//!
//! The crate works on an already deserialized [`serde_json::Value`]; reading
//! files and walking directories is left to the caller.
//!
//! - [`detect_format`] inspects the top-level keys and picks a generation
//! - [`LegacyParser`] and [`ModernParser`] implement [`DocumentParser`]
//! - [`BoxnotesService`] ties detection, parsing and rendering together
//!
//! ## Example
//!
//! ```rust
//! use boxnotes::{BoxnotesService, OutputFormat};
//! use serde_json::json;
//!
//! let note = json!({
//!     "atext": {
//!         "text": "Hello\n",
//!         "attribs": "*0+5|1",
//!         "pool": {"numToAttrib": {"0": ["bold", "true"]}}
//!     }
//! });
//!
//! let service = BoxnotesService::new();
//! let markdown = service.convert(&note, OutputFormat::Markdown).unwrap();
//! assert_eq!(markdown, "**Hello**");
//! ```

pub mod attribs;
mod detect;
mod legacy;
mod modern;
mod parser;
mod service;
mod utilities;

pub use boxnotes_core::*;
pub use detect::{detect_format, validate, validate_legacy, validate_modern, FormatType};
pub use legacy::LegacyParser;
pub use modern::ModernParser;
pub use parser::{parser_for, DocumentParser};
pub use service::{BoxnotesService, ServiceOptions};

/// Error type for Box Notes operations
#[derive(Debug, thiserror::Error)]
pub enum BoxnotesError {
    /// The input matches neither known schema, or a required field is
    /// missing or mistyped
    #[error("Unsupported Box Notes format: {0}")]
    FormatError(String),

    /// A parser could not interpret the data it was handed
    #[error("failed to parse {format}-format document: {reason}")]
    ParseError { format: FormatType, reason: String },

    /// A renderer failed to serialize the document
    #[error("Conversion error: {0}")]
    ConversionError(#[from] RenderError),
}

impl BoxnotesError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        BoxnotesError::FormatError(message.into())
    }

    pub(crate) fn parse(format: FormatType, reason: impl Into<String>) -> Self {
        BoxnotesError::ParseError {
            format,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BoxnotesError>;
