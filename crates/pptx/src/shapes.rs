//! Shapes on a slide's shape tree.
//!
//! Shapes are addressed by their position among the direct children of
//! `p:cSld/p:spTree`; group members are not counted.

use crate::template::{NS_A, NS_P, NS_R};
use crate::xml::Element;
use ppt_mcp_core::{Rect, TitleCandidate};

/// EMU per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Elements of a shape tree that count as shapes.
const SHAPE_TAGS: &[&str] = &["sp", "grpSp", "graphicFrame", "cxnSp", "pic", "contentPart"];

/// Placeholder types that are never copied from a layout onto a slide.
const FOOTER_PLACEHOLDERS: &[&str] = &["dt", "ftr", "sldNum"];

/// Placeholder types that get an empty text body when cloned.
const TEXT_PLACEHOLDERS: &[&str] = &["title", "ctrTitle", "subTitle", "body", "obj"];

pub fn points_to_emu(points: f64) -> i64 {
    (points * EMU_PER_POINT as f64).round() as i64
}

pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

pub fn shape_tree(slide: &Element) -> Option<&Element> {
    slide.find(&["cSld", "spTree"])
}

pub fn shape_tree_mut(slide: &mut Element) -> Option<&mut Element> {
    slide.find_mut(&["cSld", "spTree"])
}

fn is_shape(el: &Element) -> bool {
    SHAPE_TAGS.contains(&el.local_name())
}

/// Top-level shapes of a slide, in z-order.
pub fn shapes(slide: &Element) -> Vec<ShapeRef<'_>> {
    shape_tree(slide)
        .map(|tree| tree.elements().filter(|el| is_shape(el)).map(ShapeRef).collect())
        .unwrap_or_default()
}

pub fn shape_count(slide: &Element) -> usize {
    shape_tree(slide)
        .map(|tree| tree.elements().filter(|el| is_shape(el)).count())
        .unwrap_or(0)
}

/// Top-level shape at a 0-based position.
pub fn shape_mut(slide: &mut Element, index: usize) -> Option<&mut Element> {
    shape_tree_mut(slide)?
        .elements_mut()
        .filter(|el| is_shape(el))
        .nth(index)
}

/// The slide's title placeholder, if it has one.
pub fn title_shape_mut(slide: &mut Element) -> Option<&mut Element> {
    shape_tree_mut(slide)?
        .elements_mut()
        .filter(|el| el.is("sp"))
        .find(|el| ShapeRef(el).is_title_placeholder())
}

/// Append a shape to the slide's shape tree; returns its 1-based position.
pub fn push_shape(slide: &mut Element, shape: Element) -> Option<usize> {
    let tree = shape_tree_mut(slide)?;
    tree.push(shape);
    Some(tree.elements().filter(|el| is_shape(el)).count())
}

/// Next unused drawing object id on a slide.
pub fn next_shape_id(slide: &Element) -> u32 {
    let mut max = 1;
    slide.walk(&mut |el| {
        if el.is("cNvPr") {
            if let Some(id) = el.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                max = max.max(id);
            }
        }
    });
    max + 1
}

/// Read-only view of one shape element.
#[derive(Debug, Clone, Copy)]
pub struct ShapeRef<'a>(pub &'a Element);

impl<'a> ShapeRef<'a> {
    /// The `nvSpPr` / `nvPicPr` / ... block.
    fn non_visual(&self) -> Option<&'a Element> {
        self.0.elements().find(|el| el.local_name().starts_with("nv"))
    }

    pub fn name(&self) -> Option<&'a str> {
        self.non_visual()?.child("cNvPr")?.attr("name")
    }

    /// The `p:ph` element when the shape is a placeholder.
    pub fn placeholder(&self) -> Option<&'a Element> {
        self.non_visual()?.find(&["nvPr", "ph"])
    }

    /// Placeholder type; a `p:ph` without one is an object placeholder.
    pub fn placeholder_type(&self) -> Option<&'a str> {
        self.placeholder().map(|ph| ph.attr("type").unwrap_or("obj"))
    }

    /// Whether the shape can hold text in this backend.
    pub fn has_text_frame(&self) -> bool {
        self.0.is("sp")
    }
}

impl TitleCandidate for ShapeRef<'_> {
    fn is_title_placeholder(&self) -> bool {
        matches!(self.placeholder_type(), Some("title" | "ctrTitle"))
    }

    fn is_text_box(&self) -> bool {
        self.non_visual()
            .and_then(|nv| nv.child("cNvSpPr"))
            .and_then(|el| el.attr("txBox"))
            .is_some_and(|v| v == "1" || v == "true")
    }

    fn text(&self) -> Option<String> {
        if !self.has_text_frame() {
            return None;
        }
        self.0.child("txBody").map(text_body_text)
    }
}

/// Text of a text body: paragraphs joined by newlines, line breaks kept.
pub fn text_body_text(body: &Element) -> String {
    body.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &Element) -> String {
    let mut out = String::new();
    for el in paragraph.elements() {
        match el.local_name() {
            "r" | "fld" => {
                if let Some(t) = el.child("t") {
                    out.push_str(&t.text_content());
                }
            }
            "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Replace the text of an `sp` shape, keeping the formatting of its first
/// paragraph and run. A missing text body is created.
pub fn set_text(shape: &mut Element, text: &str) {
    if shape.child("txBody").is_none() {
        shape.push(
            Element::new("p:txBody")
                .with_child(Element::new("a:bodyPr"))
                .with_child(Element::new("a:lstStyle")),
        );
    }
    let Some(body) = shape.child_mut("txBody") else {
        return;
    };
    let first = body.child("p");
    let paragraph_props = first.and_then(|p| p.child("pPr")).cloned();
    let run_props = first
        .and_then(|p| p.child("r"))
        .and_then(|r| r.child("rPr"))
        .cloned();
    write_paragraphs(body, text, paragraph_props, run_props);
}

fn write_paragraphs(
    body: &mut Element,
    text: &str,
    paragraph_props: Option<Element>,
    run_props: Option<Element>,
) {
    body.retain_elements(|el| !el.is("p"));
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut paragraph = Element::new("a:p");
        if let Some(props) = &paragraph_props {
            paragraph.push(props.clone());
        }
        if line.is_empty() {
            paragraph.push(Element::new("a:endParaRPr").with_attr("lang", "en-US"));
        } else {
            let mut run = Element::new("a:r");
            if let Some(props) = &run_props {
                run.push(props.clone());
            }
            run.push(Element::new("a:t").with_text(line));
            paragraph.push(run);
        }
        body.push(paragraph);
    }
}

/// Run formatting for text written into a new text box.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFormat {
    /// Size in points.
    pub size: Option<f64>,
    pub bold: bool,
}

impl RunFormat {
    fn to_element(self) -> Option<Element> {
        if self.size.is_none() && !self.bold {
            return None;
        }
        let mut props = Element::new("a:rPr").with_attr("lang", "en-US");
        if let Some(size) = self.size {
            // sz is in hundredths of a point.
            props.set_attr("sz", ((size * 100.0).round() as i64).to_string());
        }
        if self.bold {
            props.set_attr("b", "1");
        }
        props.set_attr("dirty", "0");
        Some(props)
    }
}

/// Build a free-floating text box. Geometry is in EMU.
pub fn text_box(id: u32, frame: (i64, i64, i64, i64), text: &str, format: RunFormat) -> Element {
    let (x, y, cx, cy) = frame;
    let mut body = Element::new("p:txBody")
        .with_child(
            Element::new("a:bodyPr")
                .with_attr("wrap", "none")
                .with_attr("rtlCol", "0")
                .with_child(Element::new("a:spAutoFit")),
        )
        .with_child(Element::new("a:lstStyle"));
    write_paragraphs(&mut body, text, None, format.to_element());

    Element::new("p:sp")
        .with_child(
            Element::new("p:nvSpPr")
                .with_child(
                    Element::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", format!("TextBox {}", id.saturating_sub(1))),
                )
                .with_child(Element::new("p:cNvSpPr").with_attr("txBox", "1"))
                .with_child(Element::new("p:nvPr")),
        )
        .with_child(
            Element::new("p:spPr")
                .with_child(
                    Element::new("a:xfrm")
                        .with_child(
                            Element::new("a:off")
                                .with_attr("x", x.to_string())
                                .with_attr("y", y.to_string()),
                        )
                        .with_child(
                            Element::new("a:ext")
                                .with_attr("cx", cx.to_string())
                                .with_attr("cy", cy.to_string()),
                        ),
                )
                .with_child(
                    Element::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(Element::new("a:avLst")),
                )
                .with_child(Element::new("a:noFill")),
        )
        .with_child(body)
}

/// Convert a point rectangle into an EMU frame.
pub fn frame_from_points(rect: Rect) -> (i64, i64, i64, i64) {
    (
        points_to_emu(rect.left),
        points_to_emu(rect.top),
        points_to_emu(rect.width),
        points_to_emu(rect.height),
    )
}

/// A new slide whose shape tree holds the layout's content placeholders.
pub fn slide_from_layout(layout: &Element) -> Element {
    let layout_tree = shape_tree(layout);
    let group_props = |local: &str, fallback: fn() -> Element| {
        layout_tree
            .and_then(|tree| tree.child(local))
            .cloned()
            .unwrap_or_else(fallback)
    };

    let mut tree = Element::new("p:spTree")
        .with_child(group_props("nvGrpSpPr", default_group_non_visual))
        .with_child(group_props("grpSpPr", default_group_props));

    let mut next_id = 2;
    for shape in layout_tree
        .into_iter()
        .flat_map(|tree| tree.children_named("sp"))
        .map(ShapeRef)
    {
        let (Some(ph), Some(ph_type)) = (shape.placeholder(), shape.placeholder_type()) else {
            continue;
        };
        if FOOTER_PLACEHOLDERS.contains(&ph_type) {
            continue;
        }
        let name = shape
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Placeholder {}", next_id - 1));
        tree.push(placeholder_shape(next_id, &name, ph, TEXT_PLACEHOLDERS.contains(&ph_type)));
        next_id += 1;
    }

    Element::new("p:sld")
        .with_attr("xmlns:a", NS_A)
        .with_attr("xmlns:r", NS_R)
        .with_attr("xmlns:p", NS_P)
        .with_child(Element::new("p:cSld").with_child(tree))
        .with_child(Element::new("p:clrMapOvr").with_child(Element::new("a:masterClrMapping")))
}

fn placeholder_shape(id: u32, name: &str, layout_ph: &Element, with_text: bool) -> Element {
    let mut ph = Element::new("p:ph");
    ph.attributes = layout_ph.attributes.clone();

    let mut shape = Element::new("p:sp")
        .with_child(
            Element::new("p:nvSpPr")
                .with_child(
                    Element::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", name),
                )
                .with_child(
                    Element::new("p:cNvSpPr")
                        .with_child(Element::new("a:spLocks").with_attr("noGrp", "1")),
                )
                .with_child(Element::new("p:nvPr").with_child(ph)),
        )
        .with_child(Element::new("p:spPr"));

    if with_text {
        shape.push(
            Element::new("p:txBody")
                .with_child(Element::new("a:bodyPr"))
                .with_child(Element::new("a:lstStyle"))
                .with_child(
                    Element::new("a:p")
                        .with_child(Element::new("a:endParaRPr").with_attr("lang", "en-US")),
                ),
        );
    }
    shape
}

fn default_group_non_visual() -> Element {
    Element::new("p:nvGrpSpPr")
        .with_child(
            Element::new("p:cNvPr")
                .with_attr("id", "1")
                .with_attr("name", ""),
        )
        .with_child(Element::new("p:cNvGrpSpPr"))
        .with_child(Element::new("p:nvPr"))
}

fn default_group_props() -> Element {
    Element::new("p:grpSpPr")
}
