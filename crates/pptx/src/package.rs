//! OPC package handling: the ZIP container, relationship parts and the
//! content type registry.

use crate::xml::{self, Element};
use ppt_mcp_core::{Error, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the content type registry part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Relationship type URIs.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
}

/// Content types of the parts this crate writes.
pub mod content_types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Largest uncompressed part accepted from a package.
pub const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// All parts of a package, held in memory.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read every part of a ZIP package.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::read_limited(reader, MAX_PART_BYTES)
    }

    fn read_limited<R: Read + Seek>(reader: R, max_part: u64) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = BTreeMap::new();
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::Zip(format!("Failed to read entry {}: {}", index, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            if file.size() > max_part {
                return Err(oversized(&name, max_part));
            }
            // Declared sizes are not trusted; the read itself is bounded.
            let mut content = Vec::new();
            (&mut file)
                .take(max_part + 1)
                .read_to_end(&mut content)
                .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", name, e)))?;
            if content.len() as u64 > max_part {
                return Err(oversized(&name, max_part));
            }
            parts.insert(name, content);
        }

        log::debug!("Read package with {} parts", parts.len());
        Ok(Self { parts })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn part(&self, name: &str) -> Result<&[u8]> {
        self.parts
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Package(format!("missing part '{}'", name)))
    }

    /// Parse a part as XML.
    pub fn xml_part(&self, name: &str) -> Result<Element> {
        let bytes = self.part(name)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::Xml(format!("part '{}' is not UTF-8: {}", name, e)))?;
        xml::parse(text)
    }

    pub fn set_part(&mut self, name: impl Into<String>, content: Vec<u8>) {
        self.parts.insert(name.into(), content);
    }

    pub fn set_xml_part(&mut self, name: impl Into<String>, root: &Element) -> Result<()> {
        let content = xml::to_bytes(root)?;
        self.set_part(name, content);
        Ok(())
    }

    /// Relationships of a part; empty when the part has none.
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        let rels_part = rels_part_name(part);
        if !self.contains(&rels_part) {
            return Ok(Relationships::new());
        }
        Relationships::from_element(&self.xml_part(&rels_part)?)
    }

    /// Write the package as a ZIP archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        // The content type registry goes first, as Office writes it.
        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name.as_str() == CONTENT_TYPES_PART)
            .chain(
                self.parts
                    .iter()
                    .filter(|(name, _)| name.as_str() != CONTENT_TYPES_PART),
            );

        for (name, content) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::Zip(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(content)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| Error::Zip(format!("Failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }

    /// Write the package to disk.
    ///
    /// The archive is assembled in memory first so a failure never leaves a
    /// truncated file behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        log::debug!("Wrote package to {}", path.display());
        Ok(())
    }
}

/// Name of the relationships part belonging to `part`.
///
/// The package itself (empty name) owns `_rels/.rels`.
pub fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

fn directory_segments(part: &str) -> Vec<&str> {
    match part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    }
}

/// Resolve a relationship target against the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments = directory_segments(source_part);
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relative target from `source_part` to `target_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dirs = directory_segments(source_part);
    let target_segments: Vec<&str> = target_part.split('/').collect();
    let target_dirs = &target_segments[..target_segments.len().saturating_sub(1)];

    let common = source_dirs
        .iter()
        .zip(target_dirs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = std::iter::repeat("..")
        .take(source_dirs.len() - common)
        .collect();
    parts.extend_from_slice(&target_segments[common..]);
    parts.join("/")
}

/// One relationship from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Last segment of the relationship type (`slide`, `slideLayout`).
    ///
    /// Matching on this accepts both transitional and strict type URIs.
    pub fn kind(&self) -> &str {
        self.rel_type.rsplit('/').next().unwrap_or_default()
    }
}

/// The relationships owned by one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_element(root: &Element) -> Result<Self> {
        let mut items = Vec::new();
        for el in root.children_named("Relationship") {
            let id = el
                .attr("Id")
                .ok_or_else(|| Error::Package("relationship without Id".to_string()))?;
            items.push(Relationship {
                id: id.to_string(),
                rel_type: el.attr("Type").unwrap_or_default().to_string(),
                target: el.attr("Target").unwrap_or_default().to_string(),
                external: el.attr("TargetMode") == Some("External"),
            });
        }
        Ok(Self { items })
    }

    pub fn to_element(&self) -> Element {
        let mut root = Element::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.items {
            let mut el = Element::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                el.set_attr("TargetMode", "External");
            }
            root.push(el);
        }
        root
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|rel| rel.id == id)
    }

    /// First relationship of the given kind (see [`Relationship::kind`]).
    pub fn first_of_kind(&self, kind: &str) -> Option<&Relationship> {
        self.items.iter().find(|rel| rel.kind() == kind)
    }

    /// Add a relationship under the next free `rIdN` and return that id.
    pub fn add(&mut self, rel_type: &str, target: impl Into<String>) -> String {
        let next = self
            .items
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external: false,
        });
        id
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// The `[Content_Types].xml` registry.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    root: Element,
}

impl ContentTypes {
    /// Registry with the defaults every package needs.
    pub fn new() -> Self {
        let root = Element::new("Types")
            .with_attr("xmlns", CONTENT_TYPES_NS)
            .with_child(
                Element::new("Default")
                    .with_attr("Extension", "rels")
                    .with_attr("ContentType", content_types::RELATIONSHIPS),
            )
            .with_child(
                Element::new("Default")
                    .with_attr("Extension", "xml")
                    .with_attr("ContentType", content_types::XML),
            );
        Self { root }
    }

    pub fn from_element(root: Element) -> Self {
        Self { root }
    }

    pub fn element(&self) -> &Element {
        &self.root
    }

    /// Register (or replace) the content type of a part.
    pub fn add_override(&mut self, part: &str, content_type: &str) {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        let existing = self
            .root
            .elements_mut()
            .find(|el| el.is("Override") && el.attr("PartName") == Some(part_name.as_str()));
        match existing {
            Some(el) => el.set_attr("ContentType", content_type),
            None => self.root.push(
                Element::new("Override")
                    .with_attr("PartName", part_name)
                    .with_attr("ContentType", content_type),
            ),
        }
    }

    /// Content type registered for a part, by override or extension default.
    pub fn content_type(&self, part: &str) -> Option<&str> {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        let by_override = self
            .root
            .children_named("Override")
            .find(|el| el.attr("PartName") == Some(part_name.as_str()))
            .and_then(|el| el.attr("ContentType"));
        by_override.or_else(|| {
            let extension = part.rsplit_once('.')?.1;
            self.root
                .children_named("Default")
                .find(|el| {
                    el.attr("Extension")
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
                })
                .and_then(|el| el.attr("ContentType"))
        })
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

fn oversized(name: &str, max_part: u64) -> Error {
    Error::Package(format!("part '{}' is larger than {} bytes", name, max_part))
}
