//! # slidetree
//!
//! PowerPoint (PPTX) slide extraction to ordered JSON documents.
//!
//! This library opens a PPTX package, enumerates slides in presentation
//! order, resolves each slide through the presentation's relationship table,
//! walks its shape tree, and serializes either the whole slide or the shape
//! tree into an order-preserving document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slidetree::{Presentation, SerializeOptions};
//!
//! let presentation = Presentation::open("deck.pptx")?;
//! println!("Slides: {}", presentation.slide_count());
//!
//! // Full slide JSON
//! let json = presentation.slide_json(0, &SerializeOptions::default())?;
//! println!("{}", json);
//!
//! // Shape tree
//! for shape in presentation.shape_tree(0)? {
//!     println!("{} {:?}", shape.kind, shape.properties.name);
//! }
//! # Ok::<(), slidetree::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: open files through Tokio

pub mod container;
pub mod content_types;
pub mod error;
pub mod presentation;
pub mod render;
pub mod shapes;
pub mod slide;
pub mod xml;

// Re-exports
pub use container::{Package, Part, Relationship, Relationships};
pub use error::{Error, Result};
pub use presentation::{
    checked_index, serialize_shape_tree, Presentation, PresentationIndex, SlideRef, SlideSize,
};
pub use render::{DocNode, Document, DocumentKind, JsonFormat, SerializeOptions};
pub use shapes::{
    build_shape_tree, Geometry, ShapeKind, ShapeNode, ShapeProperties, TextProperties, TextRun,
};
pub use slide::{extract_clickable_text, ClickableText, Slide};
pub use xml::{ElementNode, ElementTree};

use std::path::Path;

/// Open a presentation.
///
/// # Example
///
/// ```no_run
/// let presentation = slidetree::open("deck.pptx")?;
/// println!("Slides: {}", presentation.slide_count());
/// # Ok::<(), slidetree::Error>(())
/// ```
pub fn open(path: impl AsRef<Path>) -> Result<Presentation> {
    Presentation::open(path)
}

/// Full JSON of one slide of a file, with default options.
///
/// # Example
///
/// ```no_run
/// let json = slidetree::slide_to_json("deck.pptx", 0)?;
/// std::fs::write("output0.json", json)?;
/// # Ok::<(), slidetree::Error>(())
/// ```
pub fn slide_to_json(path: impl AsRef<Path>, index: usize) -> Result<String> {
    open(path)?.slide_json(index, &SerializeOptions::default())
}

/// Shape-tree JSON of one slide of a file.
///
/// # Example
///
/// ```no_run
/// use slidetree::SerializeOptions;
///
/// let options = SerializeOptions::new().with_strip_namespaces(true);
/// let json = slidetree::shapes_to_json("deck.pptx", 0, &options)?;
/// # Ok::<(), slidetree::Error>(())
/// ```
pub fn shapes_to_json(
    path: impl AsRef<Path>,
    index: usize,
    options: &SerializeOptions,
) -> Result<String> {
    let presentation = open(path)?;
    let slide = presentation.slide(index)?;
    let doc = slide.shape_tree_document(options)?;
    render::to_json(&doc, options.format)
}
