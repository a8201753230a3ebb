//! JSON renderer implementation.

use crate::error::Result;

use super::document::Document;
use super::options::{JsonFormat, SerializeOptions};

/// Convert a Document to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(doc)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(doc)?,
    };
    Ok(json)
}

/// Convert a Document to JSON with default formatting.
pub fn to_json_default(doc: &Document) -> Result<String> {
    to_json(doc, JsonFormat::Pretty)
}

/// Convert a Document to JSON using the format from serialization options.
pub fn to_json_with_options(doc: &Document, options: &SerializeOptions) -> Result<String> {
    to_json(doc, options.format)
}
