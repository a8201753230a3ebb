//! A resolved slide: its part, parsed tree, and originating slide reference.

use crate::container::{Package, Part, Relationships, REL_TYPE_NOTES_SLIDE};
use crate::error::Result;
use crate::presentation::SlideRef;
use crate::render::{Document, SerializeOptions};
use crate::shapes::{build_shape_tree, ShapeNode};
use crate::xml::{ElementNode, ElementTree};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("failed to compile regex"));

/// A Markdown-style `[text](url)` link written in a slide's notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickableText {
    /// Link text
    pub text: String,
    /// Link target
    pub url: String,
}

/// Every `[text](url)` link in `notes`, in order of appearance.
pub fn extract_clickable_text(notes: &str) -> Vec<ClickableText> {
    LINK_RE
        .captures_iter(notes)
        .map(|caps| ClickableText {
            text: caps[1].to_string(),
            url: caps[2].to_string(),
        })
        .collect()
}

/// A slide borrowed from its [`crate::Presentation`].
///
/// Errors returned from slide methods carry the slide index.
#[derive(Debug)]
pub struct Slide<'a> {
    package: &'a Package,
    index: usize,
    slide_ref: &'a SlideRef,
    part: Part,
    tree: ElementTree,
}

impl<'a> Slide<'a> {
    pub(crate) fn new(
        package: &'a Package,
        index: usize,
        slide_ref: &'a SlideRef,
        part: Part,
        tree: ElementTree,
    ) -> Self {
        Self {
            package,
            index,
            slide_ref,
            part,
            tree,
        }
    }

    /// Zero-based position in the presentation.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The slide-id entry this slide was resolved from.
    pub fn slide_ref(&self) -> &'a SlideRef {
        self.slide_ref
    }

    /// The slide part.
    pub fn part(&self) -> &Part {
        &self.part
    }

    /// The parsed slide XML.
    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// The `p:cSld/p:spTree` element.
    pub fn shape_tree_root(&self) -> Result<&ElementNode> {
        self.tree
            .shape_tree_root()
            .map_err(|e| e.in_slide(self.index))
    }

    /// Classified shapes of the slide, in source order.
    pub fn shapes(&self) -> Result<Vec<ShapeNode>> {
        Ok(build_shape_tree(self.shape_tree_root()?))
    }

    /// Full mirror of the slide XML.
    pub fn document(&self, options: &SerializeOptions) -> Document {
        Document::from_tree(&self.tree, options)
    }

    /// Shape-tree projection of the slide.
    pub fn shape_tree_document(&self, options: &SerializeOptions) -> Result<Document> {
        let root = self.shape_tree_root()?;
        let shapes = build_shape_tree(root);
        Ok(Document::from_shapes(
            &self.part.path,
            &root.name,
            &shapes,
            options,
        ))
    }

    /// Relationship table of the slide part.
    pub fn relationships(&self) -> Result<Relationships> {
        self.package
            .read_relationships(&self.part.path)
            .map_err(|e| e.in_slide(self.index))
    }

    /// Resolve one of the slide's relationship ids, e.g. a picture's
    /// `image_rel_id`, to its part.
    pub fn resolve(&self, rel_id: &str) -> Result<Part> {
        self.package
            .resolve_relationship(&self.part.path, rel_id)
            .map_err(|e| e.in_slide(self.index))
    }

    /// Text of the title placeholder, if the slide has one.
    pub fn title(&self) -> Result<Option<String>> {
        Ok(self
            .shapes()?
            .iter()
            .find(|s| s.is_title())
            .map(ShapeNode::text))
    }

    /// Speaker notes: the body placeholder text of the slide's notes slide.
    pub fn notes(&self) -> Result<Option<String>> {
        let rels = self.relationships()?;
        let Some(rel) = rels.get_by_type(REL_TYPE_NOTES_SLIDE).first().copied() else {
            return Ok(None);
        };

        let part = self
            .package
            .resolve_in(&rels, &self.part.path, &rel.id)
            .map_err(|e| e.in_slide(self.index))?;
        let tree = ElementTree::parse(&part).map_err(|e| e.in_slide(self.index))?;
        let root = tree
            .shape_tree_root()
            .map_err(|e| e.in_slide(self.index))?;

        let body: Vec<String> = build_shape_tree(root)
            .iter()
            .filter(|s| s.properties.placeholder.as_deref() == Some("body"))
            .map(ShapeNode::text)
            .collect();

        if body.is_empty() {
            Ok(None)
        } else {
            Ok(Some(body.join("\n")))
        }
    }

    /// Links written as `[text](url)` in the speaker notes.
    pub fn clickable_text(&self) -> Result<Vec<ClickableText>> {
        Ok(self
            .notes()?
            .map(|notes| extract_clickable_text(&notes))
            .unwrap_or_default())
    }
}
