//! ZIP container abstraction for OOXML presentation packages.

use crate::content_types::{ContentTypes, CONTENT_TYPES_PATH};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// Relationship type of the package's main document (the presentation part).
pub const REL_TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type from a presentation to one of its slides.
pub const REL_TYPE_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// Relationship type from a slide to its notes slide.
pub const REL_TYPE_NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Collection of relationships parsed from a .rels file.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Map from relationship ID to relationship data
    pub by_id: HashMap<String, Relationship>,
    /// Map from relationship type to list of relationships, in file order
    pub by_type: HashMap<String, Vec<Relationship>>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Get relationships by type.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.by_type
            .get(rel_type)
            .map(|v| v.iter().collect())
            .unwrap_or_default()
    }

    /// Add a relationship.
    pub fn add(&mut self, rel: Relationship) {
        self.by_type
            .entry(rel.rel_type.clone())
            .or_default()
            .push(rel.clone());
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// One member of the container: raw bytes plus its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Path inside the container, without a leading slash
    pub path: String,
    /// Content type from `[Content_Types].xml`
    pub content_type: String,
    /// Raw content
    pub data: Vec<u8>,
}

impl Part {
    /// Decode the part content as XML text.
    pub fn xml(&self) -> Result<String> {
        decode_xml_bytes(&self.data).map_err(|e| Error::malformed_xml(&self.path, e))
    }
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// Once UTF-16 XML is decoded to a Rust String, the declaration still says
/// encoding="UTF-16", which quick-xml would then honour on the UTF-8 text.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling UTF-8 (with or without BOM) and UTF-16 LE/BE.
///
/// Bytes that are neither valid UTF-8 nor recognisable UTF-16 are rejected
/// with a diagnostic message.
pub fn decode_xml_bytes(bytes: &[u8]) -> std::result::Result<String, String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec()).map_err(|e| e.to_string());
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let content = decode_utf16(rest, u16::from_le_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let content = decode_utf16(rest, u16::from_be_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(utf8_err) => {
            // BOM-less UTF-16: ASCII markup leaves every other byte zero
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16(bytes, u16::from_le_bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16(bytes, u16::from_be_bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else {
                Err(format!("invalid encoding: {}", utf8_err))
            }
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> std::result::Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err("invalid encoding: odd number of bytes in UTF-16 content".to_string());
    }

    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| format!("invalid encoding: {}", e))
}

/// An opened presentation package.
///
/// The whole container is read into memory when the package is opened, so
/// the file handle is closed before `open` returns on every path. Reads go
/// through a lock around the archive cursor, which makes a `Package` safe to
/// share between threads.
pub struct Package {
    archive: Mutex<zip::ZipArchive<Cursor<Vec<u8>>>>,
    content_types: ContentTypes,
    part_names: Vec<String>,
}

impl Package {
    /// Open a package from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use slidetree::container::Package;
    ///
    /// let package = Package::open("deck.pptx")?;
    /// println!("{} parts", package.list_parts().len());
    /// # Ok::<(), slidetree::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = {
            let file = File::open(path)
                .map_err(|e| Error::PackageOpen(format!("{}: {}", path.display(), e)))?;
            let mut reader = BufReader::new(file);
            let mut data = Vec::new();
            reader
                .read_to_end(&mut data)
                .map_err(|e| Error::PackageOpen(format!("{}: {}", path.display(), e)))?;
            data
        };
        tracing::debug!(path = %path.display(), bytes = data.len(), "read package file");
        Self::from_bytes(data)
    }

    /// Create a package from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let cursor = Cursor::new(data);
        let mut archive = zip::ZipArchive::new(cursor)?;

        let part_names: Vec<String> = archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(String::from)
            .collect();

        let content_types = match archive.by_name(CONTENT_TYPES_PATH) {
            Ok(mut file) => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)
                    .map_err(|e| Error::PackageOpen(e.to_string()))?;
                let xml = decode_xml_bytes(&bytes)
                    .map_err(|e| Error::malformed_xml(CONTENT_TYPES_PATH, e))?;
                ContentTypes::parse(&xml)?
            }
            Err(_) => {
                tracing::warn!("package has no {}", CONTENT_TYPES_PATH);
                ContentTypes::default()
            }
        };

        tracing::debug!(parts = part_names.len(), "opened package");

        Ok(Self {
            archive: Mutex::new(archive),
            content_types,
            part_names,
        })
    }

    /// Create a package from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| Error::PackageOpen(e.to_string()))?;
        Self::from_bytes(data)
    }

    /// List all parts in the archive, in archive order.
    pub fn list_parts(&self) -> &[String] {
        &self.part_names
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        self.part_names.iter().any(|n| n == path)
    }

    /// The package's content-type table.
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Read a part from the archive.
    pub fn read_part(&self, path: &str) -> Result<Part> {
        let data = self.read_binary(path)?;
        Ok(Part {
            path: path.to_string(),
            content_type: self.content_types.content_type_for(path).to_string(),
            data,
        })
    }

    /// Read a part's raw bytes.
    pub fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.lock();
        let mut file = archive.by_name(path).map_err(|_| Error::PartNotFound {
            path: path.to_string(),
        })?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        tracing::debug!(part = path, bytes = data.len(), "read part");
        Ok(data)
    }

    /// Read a part as decoded XML text.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        self.read_part(path)?.xml()
    }

    /// Read package-level relationships (_rels/.rels).
    pub fn read_package_relationships(&self) -> Result<Relationships> {
        self.parse_relationships("_rels/.rels")
    }

    /// Read and parse the relationship table of a part.
    ///
    /// A part without a .rels file has an empty table.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        self.parse_relationships(&Self::rels_path_for(part_path))
    }

    /// Resolve a relationship id of `source_part` to the part it targets.
    ///
    /// Fails with [`Error::RelationshipNotFound`] when the id is absent from
    /// the source part's table and [`Error::PartNotFound`] when the target
    /// path is not a member of the container.
    pub fn resolve_relationship(&self, source_part: &str, rel_id: &str) -> Result<Part> {
        let rels = self.read_relationships(source_part)?;
        self.resolve_in(&rels, source_part, rel_id)
    }

    /// Resolve a relationship id against an already loaded table.
    pub fn resolve_in(&self, rels: &Relationships, source_part: &str, rel_id: &str) -> Result<Part> {
        let rel = rels.get(rel_id).ok_or_else(|| Error::RelationshipNotFound {
            source_part: source_part.to_string(),
            id: rel_id.to_string(),
        })?;

        if rel.external {
            return Err(Error::PartNotFound {
                path: rel.target.clone(),
            });
        }

        let target = Self::resolve_path(source_part, &rel.target);
        tracing::debug!(source = source_part, id = rel_id, target = %target, "resolved relationship");
        self.read_part(&target)
    }

    /// Resolve a relationship id that must have type `expected`.
    pub fn resolve_typed(
        &self,
        rels: &Relationships,
        source_part: &str,
        rel_id: &str,
        expected: &str,
    ) -> Result<Part> {
        if let Some(rel) = rels.get(rel_id) {
            if rel.rel_type != expected {
                return Err(Error::UnexpectedRelationshipType {
                    source_part: source_part.to_string(),
                    id: rel_id.to_string(),
                    rel_type: rel.rel_type.clone(),
                    expected: expected.to_string(),
                });
            }
        }
        self.resolve_in(rels, source_part, rel_id)
    }

    /// The .rels path holding a part's relationships.
    pub fn rels_path_for(part_path: &str) -> String {
        let part_path = part_path.trim_start_matches('/');
        if part_path.is_empty() {
            return "_rels/.rels".to_string();
        }
        match part_path.rsplit_once('/') {
            Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
            None => format!("_rels/{}.rels", part_path),
        }
    }

    /// Parse a relationships file.
    fn parse_relationships(&self, rels_path: &str) -> Result<Relationships> {
        if !self.exists(rels_path) {
            return Ok(Relationships::new());
        }
        let content = self.read_xml(rels_path)?;

        if content.trim().is_empty() {
            return Ok(Relationships::new());
        }

        let mut rels = Relationships::new();
        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = String::new();
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            b"TargetMode" => {
                                external = String::from_utf8_lossy(&attr.value).to_lowercase()
                                    == "external"
                            }
                            _ => {}
                        }
                    }

                    if !id.is_empty() {
                        rels.add(Relationship {
                            id,
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::malformed_xml(rels_path, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Resolve a relative target path from the part that references it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let mut segments: Vec<&str> = match base.trim_start_matches('/').rsplit_once('/') {
            Some((dir, _)) => dir.split('/').collect(),
            None => Vec::new(),
        };
        for segment in relative.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }

        segments.join("/")
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.part_names.len())
            .finish()
    }
}
