//! A parsed presentation package that can be edited and written back.

use crate::package::{
    content_types, rel_types, relative_target, rels_part_name, resolve_target, ContentTypes,
    Package, Relationships, CONTENT_TYPES_PART,
};
use crate::shapes;
use crate::template;
use crate::xml::{Element, Node};
use ppt_mcp_core::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Matches slide part names and captures their number.
static SLIDE_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"slides/slide(\d+)\.xml$").unwrap());

/// Lowest id PowerPoint assigns to a slide.
const MIN_SLIDE_ID: u32 = 256;

/// Elements of `p:presentation` that precede `p:sldIdLst`.
const BEFORE_SLIDE_LIST: &[&str] = &["sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst"];

/// One slide part with its relationships.
#[derive(Debug, Clone)]
pub struct Slide {
    pub part: String,
    pub xml: Element,
    pub rels: Relationships,
}

impl Slide {
    pub fn title(&self) -> String {
        ppt_mcp_core::resolve_title(&shapes::shapes(&self.xml))
    }

    pub fn shape_count(&self) -> usize {
        shapes::shape_count(&self.xml)
    }
}

/// An open presentation.
///
/// Parts that are edited (the presentation part, slides, their
/// relationships and the content types) are kept parsed; everything else
/// stays as raw bytes in the package and is written back untouched.
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    main_part: String,
    presentation: Element,
    presentation_rels: Relationships,
    content_types: ContentTypes,
    slides: Vec<Slide>,
    layouts: Vec<String>,
}

impl Document {
    /// A new presentation from the built-in template.
    pub fn new() -> Result<Self> {
        Self::from_package(template::new_presentation()?)
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let root_rels = package.relationships("")?;
        let main_part = root_rels
            .first_of_kind("officeDocument")
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| Error::Package("no main document relationship".to_string()))?;

        let presentation = package.xml_part(&main_part)?;
        if !presentation.is("presentation") {
            return Err(Error::Package(format!(
                "'{}' is not a presentation",
                main_part
            )));
        }
        let presentation_rels = package.relationships(&main_part)?;
        let content_types = ContentTypes::from_element(package.xml_part(CONTENT_TYPES_PART)?);

        let slides = load_slides(&package, &main_part, &presentation, &presentation_rels)?;
        let layouts = load_layouts(&package, &main_part, &presentation, &presentation_rels)?;
        log::debug!(
            "Loaded {} with {} slides and {} layouts",
            main_part,
            slides.len(),
            layouts.len()
        );

        Ok(Self {
            package,
            main_part,
            presentation,
            presentation_rels,
            content_types,
            slides,
            layouts,
        })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    /// Part names of the first master's layouts, in master order.
    pub fn layouts(&self) -> &[String] {
        &self.layouts
    }

    /// Append a slide based on the layout at `layout_index`. Returns the
    /// new slide's 0-based index.
    pub fn add_slide(&mut self, layout_index: usize) -> Result<usize> {
        let layout_part = self
            .layouts
            .get(layout_index)
            .cloned()
            .ok_or(Error::LayoutOutOfRange {
                index: layout_index,
                count: self.layouts.len(),
            })?;
        let layout = self.package.xml_part(&layout_part)?;

        let part = format!("{}/slides/slide{}.xml", self.part_dir(), self.next_slide_number());
        let xml = shapes::slide_from_layout(&layout);
        let mut rels = Relationships::new();
        rels.add(rel_types::SLIDE_LAYOUT, relative_target(&part, &layout_part));

        let rel_id = self
            .presentation_rels
            .add(rel_types::SLIDE, relative_target(&self.main_part, &part));
        let slide_id = self.next_slide_id();
        self.ensure_slide_list();
        self.presentation
            .child_mut("sldIdLst")
            .ok_or_else(|| Error::Package("slide list missing".to_string()))?
            .push(
                Element::new("p:sldId")
                    .with_attr("id", slide_id.to_string())
                    .with_attr("r:id", rel_id),
            );
        self.content_types.add_override(&part, content_types::SLIDE);

        log::debug!("Added {} from {}", part, layout_part);
        self.slides.push(Slide { part, xml, rels });
        Ok(self.slides.len() - 1)
    }

    fn part_dir(&self) -> &str {
        self.main_part
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }

    fn next_slide_number(&self) -> u32 {
        self.package
            .part_names()
            .chain(self.slides.iter().map(|slide| slide.part.as_str()))
            .filter_map(|name| SLIDE_PART_REGEX.captures(name))
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }

    fn next_slide_id(&self) -> u32 {
        self.presentation
            .child("sldIdLst")
            .into_iter()
            .flat_map(|list| list.children_named("sldId"))
            .filter_map(|el| el.attr("id")?.parse::<u32>().ok())
            .map(|id| id + 1)
            .fold(MIN_SLIDE_ID, u32::max)
    }

    /// Insert an empty `p:sldIdLst` in schema order when the deck has none.
    fn ensure_slide_list(&mut self) {
        if self.presentation.child("sldIdLst").is_some() {
            return;
        }
        let insert_at = self
            .presentation
            .children
            .iter()
            .rposition(|node| {
                matches!(node, Node::Element(el) if BEFORE_SLIDE_LIST.contains(&el.local_name()))
            })
            .map_or(0, |position| position + 1);
        self.presentation.insert(insert_at, Element::new("p:sldIdLst"));
    }

    /// Write parsed parts back into the package.
    fn flush(&mut self) -> Result<()> {
        self.package
            .set_xml_part(self.main_part.clone(), &self.presentation)?;
        self.package.set_xml_part(
            rels_part_name(&self.main_part),
            &self.presentation_rels.to_element(),
        )?;
        for slide in &self.slides {
            self.package.set_xml_part(slide.part.clone(), &slide.xml)?;
            if !slide.rels.is_empty() {
                self.package
                    .set_xml_part(rels_part_name(&slide.part), &slide.rels.to_element())?;
            }
        }
        self.package
            .set_xml_part(CONTENT_TYPES_PART, self.content_types.element())
    }

    /// Serialize the presentation to `.pptx` bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.flush()?;
        self.package.save(path)
    }
}

/// Slides in presentation order, taken from `p:sldIdLst`.
fn load_slides(
    package: &Package,
    main_part: &str,
    presentation: &Element,
    rels: &Relationships,
) -> Result<Vec<Slide>> {
    let Some(list) = presentation.child("sldIdLst") else {
        return Ok(Vec::new());
    };

    let mut slides = Vec::new();
    for entry in list.children_named("sldId") {
        let rel_id = entry
            .relationship_attr("id")
            .ok_or_else(|| Error::Package("slide entry without relationship".to_string()))?;
        let rel = rels
            .get(rel_id)
            .ok_or_else(|| Error::Package(format!("dangling slide relationship {}", rel_id)))?;
        let part = resolve_target(main_part, &rel.target);
        let xml = package.xml_part(&part)?;
        let slide_rels = package.relationships(&part)?;
        slides.push(Slide {
            part,
            xml,
            rels: slide_rels,
        });
    }
    Ok(slides)
}

/// Layout parts of the first slide master, in master order.
fn load_layouts(
    package: &Package,
    main_part: &str,
    presentation: &Element,
    rels: &Relationships,
) -> Result<Vec<String>> {
    let master_rel = presentation
        .find(&["sldMasterIdLst", "sldMasterId"])
        .and_then(|el| el.relationship_attr("id"))
        .and_then(|id| rels.get(id));
    let Some(master_rel) = master_rel else {
        log::warn!("Presentation has no slide master, new slides are unavailable");
        return Ok(Vec::new());
    };

    let master_part = resolve_target(main_part, &master_rel.target);
    let master = package.xml_part(&master_part)?;
    let master_rels = package.relationships(&master_part)?;

    let layouts = master
        .child("sldLayoutIdLst")
        .into_iter()
        .flat_map(|list| list.children_named("sldLayoutId"))
        .filter_map(|el| el.relationship_attr("id"))
        .filter_map(|id| master_rels.get(id))
        .map(|rel| resolve_target(&master_part, &rel.target))
        .filter(|part| package.contains(part))
        .collect();
    Ok(layouts)
}
