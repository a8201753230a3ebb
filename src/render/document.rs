//! Ordered document representation of slides and shape trees.

use super::options::SerializeOptions;
use crate::shapes::{ShapeKind, ShapeNode, ShapeProperties};
use crate::xml::{ElementNode, ElementTree, XmlNode};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Name given to character-data nodes.
pub const TEXT_NODE_NAME: &str = "#text";

/// What a [`Document`] mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    /// A whole slide part
    Slide,
    /// The shape-tree projection of a slide
    ShapeTree,
}

/// A named node with ordered attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocNode {
    /// Element name, or [`TEXT_NODE_NAME`] for text
    pub name: String,

    /// Shape kind (shape-tree projection only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ShapeKind>,

    /// Attributes in source order
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_attributes"
    )]
    pub attributes: Vec<(String, String)>,

    /// Shape properties (shape-tree projection only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ShapeProperties>,

    /// Text content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Children in source order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocNode>,
}

impl DocNode {
    /// Create an element node.
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            attributes: Vec::new(),
            properties: None,
            text: None,
            children: Vec::new(),
        }
    }

    /// Create a text node.
    pub fn text_node(text: impl Into<String>) -> Self {
        let mut node = Self::element(TEXT_NODE_NAME);
        node.text = Some(text.into());
        node
    }

    /// Whether this is a text node.
    pub fn is_text(&self) -> bool {
        self.name == TEXT_NODE_NAME
    }

    /// Value of an attribute by exact name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Drop for DocNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

fn serialize_attributes<S: Serializer>(
    attributes: &[(String, String)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(attributes.len()))?;
    for (key, value) in attributes {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// Serialized output: either a full slide mirror or a shape-tree projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// What the document mirrors
    pub kind: DocumentKind,
    /// Part path the content came from
    pub source: String,
    /// Root node
    pub root: DocNode,
}

impl Document {
    /// Mirror a whole parsed part.
    pub fn from_tree(tree: &ElementTree, options: &SerializeOptions) -> Self {
        Self {
            kind: DocumentKind::Slide,
            source: tree.part.clone(),
            root: convert_element(&tree.root, options),
        }
    }

    /// Project a shape tree; `root_name` names the projection's root
    /// (normally the `p:spTree` element's name).
    pub fn from_shapes(
        source: impl Into<String>,
        root_name: &str,
        shapes: &[ShapeNode],
        options: &SerializeOptions,
    ) -> Self {
        Self {
            kind: DocumentKind::ShapeTree,
            source: source.into(),
            root: convert_shapes(root_name, shapes, options),
        }
    }
}

/// Convert an element subtree with an explicit frame stack.
pub fn convert_element(element: &ElementNode, options: &SerializeOptions) -> DocNode {
    struct Frame<'a> {
        node: DocNode,
        pending: std::slice::Iter<'a, XmlNode>,
    }

    let open = |element: &ElementNode| {
        let mut node = DocNode::element(options.name(&element.name));
        node.attributes = element
            .attributes
            .iter()
            .filter(|a| options.keeps_attribute(&a.name))
            .map(|a| (options.name(&a.name).to_string(), a.value.clone()))
            .collect();
        node
    };

    let mut stack = vec![Frame {
        node: open(element),
        pending: element.children.iter(),
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            // The root frame is only popped in the branch below
            return DocNode::default();
        };
        match frame.pending.next() {
            Some(XmlNode::Element(child)) => {
                let frame = Frame {
                    node: open(child),
                    pending: child.children.iter(),
                };
                stack.push(frame);
            }
            Some(XmlNode::Text(text)) => {
                if let Some(text) = options.text(text) {
                    frame.node.children.push(DocNode::text_node(text));
                }
            }
            None => {
                let Some(done) = stack.pop() else {
                    return DocNode::default();
                };
                match stack.last_mut() {
                    Some(parent) => parent.node.children.push(done.node),
                    None => return done.node,
                }
            }
        }
    }
}

/// Convert a shape forest under a named root with an explicit frame stack.
pub fn convert_shapes(root_name: &str, shapes: &[ShapeNode], options: &SerializeOptions) -> DocNode {
    struct Frame<'a> {
        node: DocNode,
        pending: std::slice::Iter<'a, ShapeNode>,
    }

    let open = |shape: &ShapeNode| {
        let mut node = DocNode::element(options.name(&shape.name));
        node.kind = Some(shape.kind);
        node.attributes = shape
            .attributes
            .iter()
            .filter(|a| options.keeps_attribute(&a.name))
            .map(|a| (options.name(&a.name).to_string(), a.value.clone()))
            .collect();
        node.properties = Some(shape.properties.clone());
        if !shape.text_runs.is_empty() {
            node.text = options.text(&shape.text());
        }
        node
    };

    let mut stack = vec![Frame {
        node: DocNode::element(options.name(root_name)),
        pending: shapes.iter(),
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            return DocNode::default();
        };
        match frame.pending.next() {
            Some(shape) => {
                let frame = Frame {
                    node: open(shape),
                    pending: shape.children.iter(),
                };
                stack.push(frame);
            }
            None => {
                let Some(done) = stack.pop() else {
                    return DocNode::default();
                };
                match stack.last_mut() {
                    Some(parent) => parent.node.children.push(done.node),
                    None => return done.node,
                }
            }
        }
    }
}
