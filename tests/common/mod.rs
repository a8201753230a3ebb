//! Synthetic PPTX packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const PICTURE: &str = r#"<p:pic>
  <p:nvPicPr><p:cNvPr id="3" name="Picture 2" descr="Logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>
  <p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>
  <p:spPr><a:xfrm><a:off x="360000" y="360000"/><a:ext cx="3600000" cy="1800000"/></a:xfrm></p:spPr>
</p:pic>"#;

pub fn text_box(id: u32, text: &str) -> String {
    format!(
        r#"<p:sp>
  <p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
  <p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="720000" cy="360000"/></a:xfrm></p:spPr>
  <p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r></a:p></p:txBody>
</p:sp>"#
    )
}

pub fn title(text: &str) -> String {
    format!(
        r#"<p:sp>
  <p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
  <p:spPr/>
  <p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody>
</p:sp>"#
    )
}

pub fn group(children: &str) -> String {
    format!(
        r#"<p:grpSp>
  <p:nvGrpSpPr><p:cNvPr id="10" name="Group 9"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
  <p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/><a:chOff x="0" y="0"/><a:chExt cx="100" cy="100"/></a:xfrm></p:grpSpPr>
  {children}
</p:grpSp>"#
    )
}

/// Slide XML whose shape tree holds `shapes`.
pub fn slide_xml(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld>
    <p:spTree>
      <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
      <p:grpSpPr/>
      {shapes}
    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#
    )
}

fn notes_xml(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
    <p:grpSpPr/>
    <p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image 1"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>
    <p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>
      <p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>
  </p:spTree></p:cSld>
</p:notes>"#
    )
}

fn put(zip: &mut ZipWriter<Cursor<&mut Vec<u8>>>, name: &str, data: &[u8]) {
    zip.start_file(name, SimpleFileOptions::default()).unwrap();
    zip.write_all(data).unwrap();
}

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const REL_TYPE_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// Builder for an in-memory PPTX package.
#[derive(Default)]
pub struct DeckBuilder {
    slides: Vec<String>,
    notes: Vec<(usize, String)>,
    missing_rels: Vec<usize>,
    missing_parts: Vec<usize>,
    raw_slides: Vec<(usize, Vec<u8>)>,
    rel_types: Vec<(usize, String)>,
    presentation_path: Option<String>,
    office_document_target: Option<String>,
    raw_presentation_rels: Option<Vec<u8>>,
    omit_package_rels: bool,
    omit_slide_list: bool,
    omit_presentation: bool,
    reversed_rel_table: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, shapes: &str) -> Self {
        self.slides.push(slide_xml(shapes));
        self
    }

    /// Replace the bytes of slide `index` verbatim.
    pub fn raw_slide(mut self, index: usize, bytes: &[u8]) -> Self {
        self.raw_slides.push((index, bytes.to_vec()));
        self
    }

    pub fn notes(mut self, index: usize, text: &str) -> Self {
        self.notes.push((index, text.to_string()));
        self
    }

    /// Leave slide `index`'s relationship out of the presentation rels.
    pub fn without_relationship(mut self, index: usize) -> Self {
        self.missing_rels.push(index);
        self
    }

    /// Keep slide `index`'s relationship but leave the part out of the archive.
    pub fn without_part(mut self, index: usize) -> Self {
        self.missing_parts.push(index);
        self
    }

    /// Declare slide `index`'s relationship with another type.
    pub fn relationship_type(mut self, index: usize, rel_type: &str) -> Self {
        self.rel_types.push((index, rel_type.to_string()));
        self
    }

    /// Store the presentation part (and the slides beside it) under `path`.
    pub fn presentation_path(mut self, path: &str) -> Self {
        self.presentation_path = Some(path.to_string());
        self
    }

    /// Point the package's officeDocument relationship at `target`.
    pub fn office_document_target(mut self, target: &str) -> Self {
        self.office_document_target = Some(target.to_string());
        self
    }

    /// Leave `_rels/.rels` out of the archive.
    pub fn without_package_relationships(mut self) -> Self {
        self.omit_package_rels = true;
        self
    }

    /// Replace the presentation part's relationships verbatim.
    pub fn raw_presentation_relationships(mut self, bytes: &[u8]) -> Self {
        self.raw_presentation_rels = Some(bytes.to_vec());
        self
    }

    pub fn without_slide_list(mut self) -> Self {
        self.omit_slide_list = true;
        self
    }

    pub fn without_presentation(mut self) -> Self {
        self.omit_presentation = true;
        self
    }

    /// Write the presentation relationships in reverse slide order.
    pub fn reversed_relationships(mut self) -> Self {
        self.reversed_rel_table = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));

        let presentation = self
            .presentation_path
            .clone()
            .unwrap_or_else(|| PRESENTATION_PATH.to_string());
        let (dir, file) = presentation
            .rsplit_once('/')
            .unwrap_or(("", presentation.as_str()));
        let in_dir = |name: &str| {
            if dir.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", dir, name)
            }
        };

        let mut overrides = format!(
            r#"<Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            presentation
        );
        for i in 0..self.slides.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                in_dir(&format!("slides/slide{}.xml", i + 1))
            ));
        }
        put(
            &mut zip,
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/>{}</Types>"#,
                overrides
            )
            .as_bytes(),
        );

        if !self.omit_package_rels {
            let target = self
                .office_document_target
                .clone()
                .unwrap_or_else(|| format!("/{}", presentation));
            put(
                &mut zip,
                "_rels/.rels",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="{}"/></Relationships>"#,
                    target
                )
                .as_bytes(),
            );
        }

        if !self.omit_presentation {
            let mut ids = String::new();
            for i in 0..self.slides.len() {
                ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2));
            }
            let list = if self.omit_slide_list {
                String::new()
            } else {
                format!("<p:sldIdLst>{}</p:sldIdLst>", ids)
            };
            put(
                &mut zip,
                &presentation,
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
                    list
                )
                .as_bytes(),
            );
        }

        let mut rels: Vec<String> = (0..self.slides.len())
            .filter(|i| !self.missing_rels.contains(i))
            .map(|i| {
                let rel_type = self
                    .rel_types
                    .iter()
                    .find(|(idx, _)| *idx == i)
                    .map(|(_, t)| t.as_str())
                    .unwrap_or(REL_TYPE_SLIDE);
                format!(
                    r#"<Relationship Id="rId{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                    i + 2,
                    rel_type,
                    i + 1
                )
            })
            .collect();
        if self.reversed_rel_table {
            rels.reverse();
        }
        let presentation_rels = in_dir(&format!("_rels/{}.rels", file));
        match &self.raw_presentation_rels {
            Some(bytes) => put(&mut zip, &presentation_rels, bytes),
            None => put(
                &mut zip,
                &presentation_rels,
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>{}</Relationships>"#,
                    rels.concat()
                )
                .as_bytes(),
            ),
        }

        for (i, xml) in self.slides.iter().enumerate() {
            if self.missing_parts.contains(&i) {
                continue;
            }
            let name = in_dir(&format!("slides/slide{}.xml", i + 1));
            match self.raw_slides.iter().find(|(idx, _)| *idx == i) {
                Some((_, bytes)) => put(&mut zip, &name, bytes),
                None => put(&mut zip, &name, xml.as_bytes()),
            }

            let mut slide_rels = String::from(
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>"#,
            );
            if self.notes.iter().any(|(idx, _)| *idx == i) {
                slide_rels.push_str(&format!(
                    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide{}.xml"/>"#,
                    i + 1
                ));
            }
            put(
                &mut zip,
                &in_dir(&format!("slides/_rels/slide{}.xml.rels", i + 1)),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                    slide_rels
                )
                .as_bytes(),
            );
        }

        for (i, text) in &self.notes {
            put(
                &mut zip,
                &in_dir(&format!("notesSlides/notesSlide{}.xml", i + 1)),
                notes_xml(text).as_bytes(),
            );
        }

        put(&mut zip, &in_dir("media/image1.png"), b"\x89PNG\r\n\x1a\n");

        zip.finish().unwrap();
        buffer
    }
}

/// Scenario deck: `count` slides, each a picture followed by a text box.
pub fn picture_and_text_deck(count: usize) -> Vec<u8> {
    (0..count)
        .fold(DeckBuilder::new(), |deck, i| {
            deck.slide(&format!("{}{}", PICTURE, text_box(4, &format!("Slide {}", i + 1))))
        })
        .build()
}
