//! Format detection and shape validation.

use std::fmt;

use serde_json::Value;

use crate::utilities::{describe, value_kind};
use crate::{BoxnotesError, Result};

/// Box Notes schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// `atext` with a compressed attribute string (before August 2022)
    Legacy,
    /// Typed node tree under `doc` (August 2022 onwards)
    Modern,
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatType::Legacy => f.write_str("legacy"),
            FormatType::Modern => f.write_str("modern"),
        }
    }
}

/// Decide which generation a note belongs to by looking at its top-level keys.
pub fn detect_format(data: &Value) -> Result<FormatType> {
    let Some(root) = data.as_object() else {
        return Err(BoxnotesError::format(format!(
            "Box Notes data must be an object, got {}",
            value_kind(data)
        )));
    };

    if let Some(atext) = root.get("atext") {
        let Some(atext) = atext.as_object() else {
            return Err(BoxnotesError::format("legacy format 'atext' field must be an object"));
        };

        let missing: Vec<&str> = ["attribs", "text"]
            .into_iter()
            .filter(|key| !atext.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(BoxnotesError::format(format!(
                "legacy format missing required keys: {}",
                missing.join(", ")
            )));
        }

        return Ok(FormatType::Legacy);
    }

    if let Some(doc) = root.get("doc") {
        let Some(doc) = doc.as_object() else {
            return Err(BoxnotesError::format("modern format 'doc' field must be an object"));
        };

        if doc.get("type").and_then(Value::as_str) != Some("doc") {
            return Err(BoxnotesError::format(format!(
                "modern format 'doc.type' must be \"doc\", got {}",
                describe(doc.get("type"))
            )));
        }

        if !doc.contains_key("content") {
            return Err(BoxnotesError::format("modern format 'doc' missing 'content' field"));
        }

        return Ok(FormatType::Modern);
    }

    if root.get("type").and_then(Value::as_str) == Some("doc") && root.contains_key("content") {
        return Ok(FormatType::Modern);
    }

    Err(BoxnotesError::format(
        "unknown Box Notes format, expected an 'atext' (legacy) or 'doc' (modern) field",
    ))
}

/// Check the legacy shape: `atext.text` and `atext.attribs` strings, optional
/// `pool` object.
pub fn validate_legacy(data: &Value) -> Result<()> {
    let Some(atext) = data.get("atext") else {
        return Err(BoxnotesError::format("legacy format missing 'atext' field"));
    };
    let Some(atext) = atext.as_object() else {
        return Err(BoxnotesError::format("'atext' must be an object"));
    };

    for key in ["text", "attribs"] {
        match atext.get(key) {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(BoxnotesError::format(format!(
                    "'atext.{}' must be a string, got {}",
                    key,
                    value_kind(other)
                )))
            }
            None => {
                return Err(BoxnotesError::format(format!(
                    "'atext.{}' must be a string, but it is missing",
                    key
                )))
            }
        }
    }

    if let Some(pool) = atext.get("pool") {
        if !pool.is_object() {
            return Err(BoxnotesError::format("'atext.pool' must be an object"));
        }
    }

    Ok(())
}

/// Check the modern shape: a `doc` node (wrapped or bare) with a `content`
/// array.
pub fn validate_modern(data: &Value) -> Result<()> {
    let doc = data.get("doc").unwrap_or(data);

    if doc.get("type").and_then(Value::as_str) != Some("doc") {
        return Err(BoxnotesError::format(format!(
            "modern format 'type' must be \"doc\", got {}",
            describe(doc.get("type"))
        )));
    }

    match doc.get("content") {
        Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(BoxnotesError::format(format!(
            "modern format 'content' must be an array, got {}",
            value_kind(other)
        ))),
        None => Err(BoxnotesError::format("modern format missing 'content' field")),
    }
}

/// Run the validator matching `format`
pub fn validate(format: FormatType, data: &Value) -> Result<()> {
    match format {
        FormatType::Legacy => validate_legacy(data),
        FormatType::Modern => validate_modern(data),
    }
}
