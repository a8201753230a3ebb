//! Serialization options.

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Options for converting element trees and shape trees to documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Reduce element and attribute names to their local form and drop
    /// namespace declarations.
    ///
    /// Off by default: two elements from different namespaces that share a
    /// local name become indistinguishable once stripped.
    pub strip_namespaces: bool,

    /// Trim leading and trailing whitespace from text nodes
    pub trim_text: bool,

    /// JSON layout
    pub format: JsonFormat,
}

impl SerializeOptions {
    /// Create default options (namespaces kept, text verbatim, pretty JSON).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable namespace stripping.
    pub fn with_strip_namespaces(mut self, strip: bool) -> Self {
        self.strip_namespaces = strip;
        self
    }

    /// Enable or disable text trimming.
    pub fn with_text_trimming(mut self, trim: bool) -> Self {
        self.trim_text = trim;
        self
    }

    /// Set the JSON layout.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Apply the naming rule to a qualified element or attribute name.
    pub(crate) fn name<'a>(&self, qualified: &'a str) -> &'a str {
        if self.strip_namespaces {
            crate::xml::local_name(qualified)
        } else {
            qualified
        }
    }

    /// Whether an attribute survives serialization.
    pub(crate) fn keeps_attribute(&self, qualified: &str) -> bool {
        !(self.strip_namespaces && (qualified == "xmlns" || qualified.starts_with("xmlns:")))
    }

    /// Apply the text rule; `None` when the text vanishes entirely.
    pub(crate) fn text(&self, text: &str) -> Option<String> {
        let text = if self.trim_text { text.trim() } else { text };
        if self.trim_text && text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
