//! Presentation index and the consumer-facing presentation handle.

use crate::container::{Package, Relationships, REL_TYPE_OFFICE_DOCUMENT, REL_TYPE_SLIDE};
use crate::error::{Error, Result};
use crate::render::{to_json, Document, DocumentKind, SerializeOptions};
use crate::shapes::{emu_to_cm, ShapeNode};
use crate::slide::Slide;
use crate::xml::{local_name, ElementTree};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{Read, Seek};
use std::path::Path;

/// Presentation part path used when the package relationships name none.
pub const DEFAULT_PRESENTATION_PATH: &str = "ppt/presentation.xml";

/// One entry of the presentation's slide-id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideRef {
    /// `p:sldId/@id`
    pub slide_id: String,
    /// `p:sldId/@r:id`, resolved against the presentation part's relationships
    pub rel_id: String,
}

/// Slide dimensions from `p:sldSz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideSize {
    /// Width in EMU
    pub cx: i64,
    /// Height in EMU
    pub cy: i64,
    /// Preset name (e.g. `screen16x9`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl SlideSize {
    /// Width in centimetres, rounded to 4 decimals.
    pub fn width_cm(&self) -> f64 {
        emu_to_cm(self.cx)
    }

    /// Height in centimetres, rounded to 4 decimals.
    pub fn height_cm(&self) -> f64 {
        emu_to_cm(self.cy)
    }
}

/// Slide order and relationship table of the presentation part.
#[derive(Debug, Clone)]
pub struct PresentationIndex {
    /// Path of the presentation part
    pub part: String,
    /// Slide-id list in document order
    pub slide_refs: Vec<SlideRef>,
    /// Relationship table of the presentation part
    pub rels: Relationships,
    /// Slide size, if declared
    pub slide_size: Option<SlideSize>,
}

impl PresentationIndex {
    /// Locate and read the presentation part of a package.
    pub fn load(package: &Package) -> Result<Self> {
        let part = Self::locate(package)?;
        let tree = package
            .read_part(&part)
            .and_then(|p| ElementTree::parse(&p))
            .map_err(|e| Error::MalformedPresentation(e.to_string()))?;
        let rels = package
            .read_relationships(&part)
            .map_err(|e| Error::MalformedPresentation(e.to_string()))?;

        let list = tree.root.child("sldIdLst").ok_or_else(|| {
            Error::MalformedPresentation(format!("{} has no slide-id list", part))
        })?;

        let mut slide_refs = Vec::new();
        for entry in list.elements().filter(|e| e.local_name() == "sldId") {
            let slide_id = entry
                .attributes
                .iter()
                .find(|a| a.name == "id")
                .map(|a| a.value.clone())
                .unwrap_or_default();
            // The relationship id is the namespaced `r:id`, whatever its prefix
            let rel_id = entry
                .attributes
                .iter()
                .find(|a| a.name != "id" && local_name(&a.name) == "id")
                .map(|a| a.value.clone())
                .unwrap_or_default();
            if rel_id.is_empty() {
                tracing::warn!(slide_id = %slide_id, "slide-id entry has no relationship id");
            }
            slide_refs.push(SlideRef { slide_id, rel_id });
        }

        let slide_size = tree.root.child("sldSz").map(|sz| SlideSize {
            cx: sz.attr("cx").and_then(|v| v.parse().ok()).unwrap_or(0),
            cy: sz.attr("cy").and_then(|v| v.parse().ok()).unwrap_or(0),
            kind: sz.attr("type").map(String::from),
        });

        tracing::debug!(part = %part, slides = slide_refs.len(), "loaded presentation index");

        Ok(Self {
            part,
            slide_refs,
            rels,
            slide_size,
        })
    }

    fn locate(package: &Package) -> Result<String> {
        let package_rels = package.read_package_relationships()?;
        let from_rels = package_rels
            .get_by_type(REL_TYPE_OFFICE_DOCUMENT)
            .first()
            .map(|rel| Package::resolve_path("", &rel.target));

        match from_rels {
            Some(path) if package.exists(&path) => Ok(path),
            Some(path) => Err(Error::MalformedPresentation(format!(
                "presentation part {} is missing",
                path
            ))),
            None if package.exists(DEFAULT_PRESENTATION_PATH) => {
                Ok(DEFAULT_PRESENTATION_PATH.to_string())
            }
            None => Err(Error::MalformedPresentation(
                "package has no presentation part".to_string(),
            )),
        }
    }

    /// Number of entries in the slide-id list.
    pub fn slide_count(&self) -> usize {
        self.slide_refs.len()
    }

    /// The `index`-th slide-id entry in document order.
    pub fn slide_ref_at(&self, index: usize) -> Result<&SlideRef> {
        self.slide_refs.get(index).ok_or(Error::IndexOutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            count: self.slide_refs.len(),
        })
    }
}

/// Convert a caller-supplied signed index into a slide position.
pub fn checked_index(index: i64, count: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < count)
        .ok_or(Error::IndexOutOfRange { index, count })
}

/// An opened presentation: the package plus its slide index.
///
/// # Example
///
/// ```no_run
/// use slidetree::{Presentation, SerializeOptions};
///
/// let presentation = Presentation::open("deck.pptx")?;
/// for index in 0..presentation.slide_count() {
///     let json = presentation.slide_json(index, &SerializeOptions::default())?;
///     std::fs::write(format!("output{}.json", index), json)?;
/// }
/// # Ok::<(), slidetree::Error>(())
/// ```
#[derive(Debug)]
pub struct Presentation {
    package: Package,
    index: PresentationIndex,
}

impl Presentation {
    /// Open a PPTX file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    /// Open a PPTX file, reading it with Tokio.
    #[cfg(feature = "async")]
    pub async fn open_async(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Error::PackageOpen(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data)
    }

    /// Open a presentation from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_package(Package::from_bytes(data)?)
    }

    /// Open a presentation from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(Package::from_reader(reader)?)
    }

    /// Wrap an already opened package.
    pub fn from_package(package: Package) -> Result<Self> {
        let index = PresentationIndex::load(&package)?;
        Ok(Self { package, index })
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The presentation index.
    pub fn index(&self) -> &PresentationIndex {
        &self.index
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.index.slide_count()
    }

    /// Slide-id list in document order.
    pub fn slide_refs(&self) -> &[SlideRef] {
        &self.index.slide_refs
    }

    /// The `index`-th slide reference.
    pub fn slide_ref_at(&self, index: usize) -> Result<&SlideRef> {
        self.index.slide_ref_at(index)
    }

    /// Slide size, if the presentation declares one.
    pub fn slide_size(&self) -> Option<&SlideSize> {
        self.index.slide_size.as_ref()
    }

    /// Resolve and parse the slide at `index`.
    ///
    /// Failures other than [`Error::IndexOutOfRange`] are wrapped in
    /// [`Error::Slide`] carrying the index; [`Error::root`] unwraps them.
    /// A slide-id entry whose relationship is not a slide relationship
    /// fails with [`Error::UnexpectedRelationshipType`].
    pub fn slide(&self, index: usize) -> Result<Slide<'_>> {
        let slide_ref = self.index.slide_ref_at(index)?;
        let part = self
            .package
            .resolve_typed(
                &self.index.rels,
                &self.index.part,
                &slide_ref.rel_id,
                REL_TYPE_SLIDE,
            )
            .map_err(|e| e.in_slide(index))?;
        let tree = ElementTree::parse(&part).map_err(|e| e.in_slide(index))?;
        tracing::debug!(index, part = %part.path, "loaded slide");
        Ok(Slide::new(&self.package, index, slide_ref, part, tree))
    }

    /// Full JSON mirror of the slide at `index`.
    pub fn slide_json(&self, index: usize, options: &SerializeOptions) -> Result<String> {
        let slide = self.slide(index)?;
        to_json(&slide.document(options), options.format)
    }

    /// Shape tree of the slide at `index`.
    pub fn shape_tree(&self, index: usize) -> Result<Vec<ShapeNode>> {
        self.slide(index)?.shapes()
    }

    /// Serialize every slide in parallel.
    ///
    /// Results come back in slide order; one slide failing leaves the others
    /// untouched.
    pub fn serialize_all(
        &self,
        kind: DocumentKind,
        options: &SerializeOptions,
    ) -> Vec<Result<Document>> {
        // collect() on an indexed parallel iterator keeps slide order
        (0..self.slide_count())
            .into_par_iter()
            .map(|index| {
                let slide = self.slide(index)?;
                match kind {
                    DocumentKind::Slide => Ok(slide.document(options)),
                    DocumentKind::ShapeTree => slide.shape_tree_document(options),
                }
            })
            .collect()
    }
}

/// Serialize a shape tree produced by [`Slide::shapes`] as JSON.
///
/// `root_name` names the projection's root; pass the shape-tree root's
/// qualified name (see [`Slide::shape_tree_root`]) so the output matches
/// [`Slide::shape_tree_document`].
pub fn serialize_shape_tree(
    source: &str,
    root_name: &str,
    shapes: &[ShapeNode],
    options: &SerializeOptions,
) -> Result<String> {
    let doc = Document::from_shapes(source, root_name, shapes, options);
    to_json(&doc, options.format)
}
