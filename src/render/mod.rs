//! Serialization of slides and shape trees.
//!
//! This module converts parsed element trees and shape trees into an
//! ordered [`Document`] and renders that document as JSON.
//!
//! # Example
//!
//! ```no_run
//! use slidetree::{render::*, Presentation};
//!
//! let presentation = Presentation::open("deck.pptx")?;
//! let slide = presentation.slide(0)?;
//!
//! // Full slide mirror
//! let doc = slide.document(&SerializeOptions::default());
//! let json = to_json(&doc, JsonFormat::Pretty)?;
//!
//! // Shape-tree projection with namespace prefixes removed
//! let options = SerializeOptions::new().with_strip_namespaces(true);
//! let shapes = slide.shape_tree_document(&options)?;
//! # Ok::<(), slidetree::Error>(())
//! ```

mod document;
mod json;
mod options;

pub use document::{
    convert_element, convert_shapes, DocNode, Document, DocumentKind, TEXT_NODE_NAME,
};
pub use json::{to_json, to_json_default, to_json_with_options};
pub use options::{JsonFormat, SerializeOptions};
