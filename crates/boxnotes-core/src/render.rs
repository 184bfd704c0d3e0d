//! Renderer interface shared by the Markdown and plain text backends

use crate::model::Document;

/// Error raised while serializing a document
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to write {format} output: {source}")]
    Write {
        format: &'static str,
        #[source]
        source: std::fmt::Error,
    },
}

impl RenderError {
    pub(crate) fn write(format: &'static str) -> impl FnOnce(std::fmt::Error) -> Self {
        move |source| RenderError::Write { format, source }
    }
}

/// Turns a [`Document`] into text
pub trait Renderer {
    fn render(&self, document: &Document) -> Result<String, RenderError>;
}

/// Join rendered top-level blocks with a blank line, skipping empty ones
pub(crate) fn join_blocks(rendered: impl IntoIterator<Item = String>) -> String {
    rendered
        .into_iter()
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
