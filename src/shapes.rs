//! Shape tree walking.
//!
//! Turns the children of a slide's `p:spTree` into [`ShapeNode`]s, classified
//! by element name and nested for group shapes. Traversal uses an explicit
//! work-list, so group nesting depth is bounded only by memory.

use crate::xml::{Attribute, ElementNode, XmlNode};
use serde::Serialize;

/// EMUs per centimetre.
pub const EMU_PER_CM: f64 = 360_000.0;

/// Kind of a drawable object, dispatched on its element's local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShapeKind {
    /// `p:pic`
    Picture,
    /// `p:sp`
    TextBox,
    /// `p:grpSp`
    GroupShape,
    /// `p:cxnSp`
    Connector,
    /// Any other drawable (`p:graphicFrame`, `p:contentPart`, `mc:AlternateContent`, ...)
    GenericShape,
}

impl ShapeKind {
    /// Classify an element by local name. Unknown names are kept as
    /// [`ShapeKind::GenericShape`].
    pub fn classify(local_name: &str) -> Self {
        match local_name {
            "pic" => ShapeKind::Picture,
            "sp" => ShapeKind::TextBox,
            "grpSp" => ShapeKind::GroupShape,
            "cxnSp" => ShapeKind::Connector,
            _ => ShapeKind::GenericShape,
        }
    }

    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Picture => "Picture",
            ShapeKind::TextBox => "TextBox",
            ShapeKind::GroupShape => "GroupShape",
            ShapeKind::Connector => "Connector",
            ShapeKind::GenericShape => "GenericShape",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a child of `p:spTree` / `p:grpSp` is a drawable object rather
/// than the container's own properties.
pub fn is_drawable(local_name: &str) -> bool {
    !matches!(local_name, "nvGrpSpPr" | "grpSpPr" | "extLst")
}

/// Offset and extent of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Width
    pub cx: i64,
    /// Height
    pub cy: i64,
}

impl Geometry {
    /// `[left, top, width, height]` in centimetres, rounded to 4 decimals.
    pub fn to_cm(&self) -> [f64; 4] {
        [self.x, self.y, self.cx, self.cy].map(emu_to_cm)
    }
}

/// Convert EMU to centimetres, rounded to 4 decimals.
pub fn emu_to_cm(emu: i64) -> f64 {
    (emu as f64 / EMU_PER_CM * 10_000.0).round() / 10_000.0
}

/// A run of text from a shape's text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    /// Zero-based paragraph index within the shape
    pub paragraph: usize,
    /// Run text
    pub text: String,
}

/// Character formatting of a shape's first text run (`a:r/a:rPr`).
///
/// Attributes the run leaves unset are `None`; they inherit from the
/// layout or master, which is not resolved here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextProperties {
    /// `a:latin/@typeface`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// `@sz` in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// `@b`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// `@i`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// `@u`, false only for `none`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// `a:solidFill/a:srgbClr/@val` as hex RGB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TextProperties {
    fn from_run_properties(r_pr: &ElementNode) -> Self {
        Self {
            font_name: r_pr
                .child("latin")
                .and_then(|latin| latin.attr("typeface"))
                .map(String::from),
            font_size: r_pr
                .attr("sz")
                .and_then(|v| v.parse::<u32>().ok())
                .map(|hundredths| f64::from(hundredths) / 100.0),
            bold: r_pr.attr("b").and_then(parse_on_off),
            italic: r_pr.attr("i").and_then(parse_on_off),
            underline: r_pr.attr("u").map(|u| u != "none"),
            color: r_pr
                .path(&["solidFill", "srgbClr"])
                .and_then(|clr| clr.attr("val"))
                .map(String::from),
        }
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Non-visual and layout properties read from a shape's own markup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapeProperties {
    /// `cNvPr/@id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `cNvPr/@name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `cNvPr/@descr` (alt text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `nvPr/ph/@type`; an untyped placeholder reads as `obj`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// `xfrm` offset and extent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// `blipFill/blip/@r:embed` relationship id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_rel_id: Option<String>,
    /// Formatting of the first text run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_properties: Option<TextProperties>,
}

/// A classified drawable object.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeNode {
    /// Shape kind
    pub kind: ShapeKind,
    /// Qualified element name (e.g. `p:pic`)
    pub name: String,
    /// The element's own attributes in source order
    pub attributes: Vec<Attribute>,
    /// Text runs of the shape's text body; empty for groups
    pub text_runs: Vec<TextRun>,
    /// Properties read from the shape's markup
    pub properties: ShapeProperties,
    /// Nested shapes, only ever non-empty for [`ShapeKind::GroupShape`]
    pub children: Vec<ShapeNode>,
}

impl ShapeNode {
    /// Local (unprefixed) element name.
    pub fn local_name(&self) -> &str {
        crate::xml::local_name(&self.name)
    }

    /// Shape text with paragraphs separated by newlines.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut current = 0;
        for run in &self.text_runs {
            while current < run.paragraph {
                out.push('\n');
                current += 1;
            }
            out.push_str(&run.text);
        }
        out
    }

    /// Whether this is a title or centred-title placeholder.
    pub fn is_title(&self) -> bool {
        matches!(
            self.properties.placeholder.as_deref(),
            Some("title") | Some("ctrTitle")
        )
    }

    fn from_element(element: &ElementNode) -> Self {
        let kind = ShapeKind::classify(element.local_name());
        tracing::trace!(element = %element.name, kind = %kind, "classified shape");
        let content = content_of(element);
        Self {
            kind,
            name: element.name.clone(),
            attributes: element.attributes.clone(),
            text_runs: if kind == ShapeKind::GroupShape {
                Vec::new()
            } else {
                collect_text_runs(content)
            },
            properties: read_properties(content, kind != ShapeKind::GroupShape),
            children: Vec::new(),
        }
    }
}

impl Drop for ShapeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Build the shape list under a shape-tree root (`p:spTree`), in source order.
pub fn build_shape_tree(root: &ElementNode) -> Vec<ShapeNode> {
    // Pre-order arena: every node's index is greater than its parent's and
    // siblings take increasing indices.
    let mut arena: Vec<(Option<ShapeNode>, Option<usize>)> = Vec::new();
    let mut work: Vec<(&ElementNode, Option<usize>)> = drawable_children(root)
        .rev()
        .map(|e| (e, None))
        .collect();

    while let Some((element, parent)) = work.pop() {
        let index = arena.len();
        let node = ShapeNode::from_element(element);
        if node.kind == ShapeKind::GroupShape {
            work.extend(drawable_children(element).rev().map(|e| (e, Some(index))));
        }
        arena.push((Some(node), parent));
    }

    // Attach bottom-up: when a node is moved, all of its children have been
    // moved into it already (pushed in reverse order).
    let mut top_level = Vec::new();
    for index in (0..arena.len()).rev() {
        let (slot, parent) = &mut arena[index];
        let parent = *parent;
        let Some(mut node) = slot.take() else {
            continue;
        };
        node.children.reverse();
        match parent {
            Some(p) => {
                if let Some(parent_node) = arena[p].0.as_mut() {
                    parent_node.children.push(node);
                }
            }
            None => top_level.push(node),
        }
    }
    top_level.reverse();
    top_level
}

/// Total number of shapes in a forest, nested ones included.
pub fn count_shapes(shapes: &[ShapeNode]) -> usize {
    let mut count = 0;
    let mut work: Vec<&ShapeNode> = shapes.iter().collect();
    while let Some(node) = work.pop() {
        count += 1;
        work.extend(node.children.iter());
    }
    count
}

fn drawable_children(
    element: &ElementNode,
) -> impl DoubleEndedIterator<Item = &ElementNode> {
    element.children.iter().filter_map(|c| match c {
        XmlNode::Element(e) if is_drawable(e.local_name()) => Some(e),
        _ => None,
    })
}

/// The element a shape's text and properties are read from.
///
/// `mc:AlternateContent` carries the same object once per branch; only
/// `mc:Fallback` (or, failing that, the first `mc:Choice`) is read, and
/// within it the wrapped shape when there is exactly one.
fn content_of(element: &ElementNode) -> &ElementNode {
    if element.local_name() != "AlternateContent" {
        return element;
    }
    let Some(branch) = element
        .child("Fallback")
        .or_else(|| element.child("Choice"))
    else {
        return element;
    };
    let mut shapes = branch.elements();
    match (shapes.next(), shapes.next()) {
        (Some(only), None) => only,
        _ => branch,
    }
}

fn collect_text_runs(element: &ElementNode) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut paragraph: Option<usize> = None;
    let mut paragraphs_seen = 0;

    for node in element.descendants() {
        match node.local_name() {
            // a:p
            "p" => {
                paragraph = Some(paragraphs_seen);
                paragraphs_seen += 1;
            }
            "t" => {
                let text = node.text();
                if !text.is_empty() {
                    runs.push(TextRun {
                        paragraph: paragraph.unwrap_or(0),
                        text,
                    });
                }
            }
            _ => {}
        }
    }

    runs
}

fn read_properties(element: &ElementNode, with_text: bool) -> ShapeProperties {
    let mut props = ShapeProperties::default();

    // Non-visual properties live in the first nv*Pr child
    if let Some(nv) = element
        .elements()
        .find(|e| e.local_name().starts_with("nv") && e.local_name().ends_with("Pr"))
    {
        if let Some(c_nv_pr) = nv.child("cNvPr") {
            props.id = c_nv_pr.attr("id").map(String::from);
            props.name = c_nv_pr.attr("name").map(String::from);
            props.description = c_nv_pr.attr("descr").map(String::from);
        }
        if let Some(ph) = nv.path(&["nvPr", "ph"]) {
            props.placeholder = Some(ph.attr("type").unwrap_or("obj").to_string());
        }
    }

    let xfrm = element
        .elements()
        .find(|e| matches!(e.local_name(), "spPr" | "grpSpPr"))
        .and_then(|pr| pr.child("xfrm"))
        .or_else(|| element.child("xfrm"));
    if let Some(xfrm) = xfrm {
        let off = xfrm.child("off");
        let ext = xfrm.child("ext");
        let read = |node: Option<&ElementNode>, name: &str| {
            node.and_then(|n| n.attr(name))
                .and_then(|v| v.parse::<i64>().ok())
        };
        if off.is_some() || ext.is_some() {
            props.geometry = Some(Geometry {
                x: read(off, "x").unwrap_or(0),
                y: read(off, "y").unwrap_or(0),
                cx: read(ext, "cx").unwrap_or(0),
                cy: read(ext, "cy").unwrap_or(0),
            });
        }
    }

    if let Some(blip) = element.path(&["blipFill", "blip"]) {
        props.image_rel_id = blip.attr("embed").map(String::from);
    }

    if with_text {
        props.text_properties = element
            .descendants()
            .find(|e| e.local_name() == "r")
            .map(|run| {
                run.child("rPr")
                    .map(TextProperties::from_run_properties)
                    .unwrap_or_default()
            });
    }

    props
}
