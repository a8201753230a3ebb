//! In-memory XML element tree for slide parts.
//!
//! Parsing is driven by an explicit element stack rather than recursion, so
//! arbitrarily deep documents parse (and drop) without growing the call stack.

use crate::container::Part;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};

/// An attribute with its qualified name (e.g. `r:embed`), in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name
    pub name: String,
    /// Unescaped value
    pub value: String,
}

/// A child of an element: a nested element or a run of character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Nested element
    Element(ElementNode),
    /// Character data (entities resolved, CDATA included)
    Text(String),
}

/// One element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementNode {
    /// Qualified element name (e.g. `p:sp`)
    pub name: String,
    /// Attributes, namespace declarations included
    pub attributes: Vec<Attribute>,
    /// Child nodes
    pub children: Vec<XmlNode>,
}

impl ElementNode {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Value of the first attribute whose local name matches.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| local_name(&a.name) == local)
            .map(|a| a.value.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&ElementNode> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// Follow a chain of child local names.
    pub fn path(&self, locals: &[&str]) -> Option<&ElementNode> {
        locals
            .iter()
            .try_fold(self, |node, local| node.child(local))
    }

    /// Concatenated direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Every descendant element in depth-first document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&ElementNode> = self.elements().collect();
        stack.reverse();
        Descendants { stack }
    }
}

impl Drop for ElementNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let XmlNode::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

/// Depth-first iterator returned by [`ElementNode::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a ElementNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a ElementNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(node.elements());
        self.stack[start..].reverse();
        Some(node)
    }
}

/// Strip the namespace prefix from a qualified name.
pub fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map(|(_, local)| local)
        .unwrap_or(qualified)
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTree {
    /// Path of the part the tree came from (empty for loose input)
    pub part: String,
    /// Document element
    pub root: ElementNode,
}

impl ElementTree {
    /// Parse a part's raw bytes.
    pub fn parse(part: &Part) -> Result<Self> {
        let xml = part.xml()?;
        Self::parse_str(&part.path, &xml)
    }

    /// Parse decoded XML text; `part` names the source in errors.
    pub fn parse_str(part: &str, xml: &str) -> Result<Self> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<ElementNode> = Vec::new();
        let mut root: Option<ElementNode> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if root.is_some() {
                        return Err(Error::malformed_xml(part, "content after document element"));
                    }
                    stack.push(element_from(part, &e)?);
                }
                Ok(Event::Empty(e)) => {
                    if root.is_some() {
                        return Err(Error::malformed_xml(part, "content after document element"));
                    }
                    let element = element_from(part, &e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => root = Some(element),
                    }
                }
                Ok(Event::End(_)) => {
                    // quick-xml has already matched the end name against the open tag
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::malformed_xml(part, "unexpected closing tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => root = Some(element),
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| Error::malformed_xml(part, err))?;
                    push_text(part, &mut stack, &text)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    push_text(part, &mut stack, &text)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::malformed_xml(part, e)),
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::malformed_xml(
                part,
                format!("unclosed element <{}>", open.name),
            ));
        }

        let root = root.ok_or_else(|| Error::malformed_xml(part, "no document element"))?;
        Ok(Self {
            part: part.to_string(),
            root,
        })
    }

    /// The slide's `cSld/spTree` element.
    pub fn shape_tree_root(&self) -> Result<&ElementNode> {
        self.root
            .path(&["cSld", "spTree"])
            .ok_or_else(|| Error::ShapeTreeNotFound {
                part: self.part.clone(),
            })
    }
}

fn element_from(part: &str, start: &BytesStart<'_>) -> Result<ElementNode> {
    let mut element = ElementNode::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::malformed_xml(part, e))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::malformed_xml(part, e))?;
        element.attributes.push(Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).to_string(),
            value: value.to_string(),
        });
    }
    Ok(element)
}

fn push_text(part: &str, stack: &mut [ElementNode], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            // Indentation between elements is dropped; text inside a:t is kept verbatim
            if !text.trim().is_empty() || parent.local_name() == "t" {
                parent.children.push(XmlNode::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(Error::malformed_xml(part, "text outside document element")),
    }
}
