//! Built-in package for new presentations.
//!
//! A 4:3 deck with one master carrying the eleven standard Office layouts,
//! in the order PowerPoint lists them. Layout positions matter: the file
//! backend maps Office layout codes to indices into this list.

use crate::package::{
    content_types as ct, rel_types, ContentTypes, Package, Relationships, CONTENT_TYPES_PART,
};
use ppt_mcp_core::Result;

pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// Slide size in EMU (10in x 7.5in).
pub const SLIDE_WIDTH: i64 = 9_144_000;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

const FIRST_LAYOUT_ID: u64 = 2_147_483_649;

/// Position and size in EMU.
type Frame = (i64, i64, i64, i64);

const TITLE: Frame = (457_200, 274_638, 8_229_600, 1_143_000);
const BODY: Frame = (457_200, 1_600_200, 8_229_600, 4_525_963);
const DATE: Frame = (457_200, 6_356_350, 2_133_600, 365_125);
const FOOTER: Frame = (3_124_200, 6_356_350, 2_895_600, 365_125);
const SLIDE_NUMBER: Frame = (6_553_200, 6_356_350, 2_133_600, 365_125);

struct Placeholder {
    name: &'static str,
    ph_type: Option<&'static str>,
    idx: Option<u32>,
    vertical: bool,
    frame: Frame,
}

const fn ph(name: &'static str, ph_type: &'static str, frame: Frame) -> Placeholder {
    Placeholder {
        name,
        ph_type: Some(ph_type),
        idx: None,
        vertical: false,
        frame,
    }
}

const fn content(name: &'static str, idx: u32, frame: Frame) -> Placeholder {
    Placeholder {
        name,
        ph_type: None,
        idx: Some(idx),
        vertical: false,
        frame,
    }
}

const fn typed(name: &'static str, ph_type: &'static str, idx: u32, frame: Frame) -> Placeholder {
    Placeholder {
        name,
        ph_type: Some(ph_type),
        idx: Some(idx),
        vertical: false,
        frame,
    }
}

const fn vertical(mut placeholder: Placeholder) -> Placeholder {
    placeholder.vertical = true;
    placeholder
}

struct Layout {
    name: &'static str,
    layout_type: &'static str,
    placeholders: &'static [Placeholder],
}

const LAYOUTS: &[Layout] = &[
    Layout {
        name: "Title Slide",
        layout_type: "title",
        placeholders: &[
            ph("Title 1", "ctrTitle", (685_800, 2_130_425, 7_772_400, 1_470_025)),
            typed("Subtitle 2", "subTitle", 1, (1_371_600, 3_886_200, 6_400_800, 1_752_600)),
        ],
    },
    Layout {
        name: "Title and Content",
        layout_type: "obj",
        placeholders: &[ph("Title 1", "title", TITLE), content("Content Placeholder 2", 1, BODY)],
    },
    Layout {
        name: "Section Header",
        layout_type: "secHead",
        placeholders: &[
            ph("Title 1", "title", (722_313, 4_406_900, 7_772_400, 1_362_075)),
            typed("Text Placeholder 2", "body", 1, (722_313, 2_906_713, 7_772_400, 1_500_187)),
        ],
    },
    Layout {
        name: "Two Content",
        layout_type: "twoObj",
        placeholders: &[
            ph("Title 1", "title", TITLE),
            content("Content Placeholder 2", 1, (457_200, 1_600_200, 4_038_600, 4_525_963)),
            content("Content Placeholder 3", 2, (4_648_200, 1_600_200, 4_038_600, 4_525_963)),
        ],
    },
    Layout {
        name: "Comparison",
        layout_type: "twoTxTwoObj",
        placeholders: &[
            ph("Title 1", "title", TITLE),
            typed("Text Placeholder 2", "body", 1, (457_200, 1_535_113, 4_040_188, 639_762)),
            content("Content Placeholder 3", 2, (457_200, 2_174_875, 4_040_188, 3_951_288)),
            typed("Text Placeholder 4", "body", 3, (4_645_025, 1_535_113, 4_041_775, 639_762)),
            content("Content Placeholder 5", 4, (4_645_025, 2_174_875, 4_041_775, 3_951_288)),
        ],
    },
    Layout {
        name: "Title Only",
        layout_type: "titleOnly",
        placeholders: &[ph("Title 1", "title", TITLE)],
    },
    Layout {
        name: "Blank",
        layout_type: "blank",
        placeholders: &[],
    },
    Layout {
        name: "Content with Caption",
        layout_type: "objTx",
        placeholders: &[
            ph("Title 1", "title", (457_200, 273_050, 3_008_313, 1_162_050)),
            content("Content Placeholder 2", 1, (3_575_050, 273_050, 5_111_750, 5_853_113)),
            typed("Text Placeholder 3", "body", 2, (457_200, 1_435_100, 3_008_313, 4_691_063)),
        ],
    },
    Layout {
        name: "Picture with Caption",
        layout_type: "picTx",
        placeholders: &[
            ph("Title 1", "title", (1_792_288, 4_800_600, 5_486_400, 566_738)),
            typed("Picture Placeholder 2", "pic", 1, (1_792_288, 612_775, 5_486_400, 4_114_800)),
            typed("Text Placeholder 3", "body", 2, (1_792_288, 5_367_338, 5_486_400, 804_862)),
        ],
    },
    Layout {
        name: "Title and Vertical Text",
        layout_type: "vertTx",
        placeholders: &[
            ph("Title 1", "title", TITLE),
            vertical(typed("Vertical Text Placeholder 2", "body", 1, BODY)),
        ],
    },
    Layout {
        name: "Vertical Title and Text",
        layout_type: "vertTitleAndTx",
        placeholders: &[
            vertical(ph("Vertical Title 1", "title", (6_629_400, 274_638, 2_057_400, 5_851_525))),
            vertical(typed(
                "Vertical Text Placeholder 2",
                "body",
                1,
                (457_200, 274_638, 6_019_800, 5_851_525),
            )),
        ],
    },
];

/// Footer placeholders every layout and the master carry.
const FOOTERS: &[Placeholder] = &[
    typed("Date Placeholder", "dt", 10, DATE),
    typed("Footer Placeholder", "ftr", 11, FOOTER),
    typed("Slide Number Placeholder", "sldNum", 12, SLIDE_NUMBER),
];

/// Number of layouts in the built-in master.
pub fn layout_count() -> usize {
    LAYOUTS.len()
}

/// Build the package of an empty presentation.
pub fn new_presentation() -> Result<Package> {
    let mut package = Package::new();
    let mut types = ContentTypes::new();

    let mut root_rels = Relationships::new();
    root_rels.add(rel_types::OFFICE_DOCUMENT, "ppt/presentation.xml");
    root_rels.add(rel_types::CORE_PROPERTIES, "docProps/core.xml");
    root_rels.add(rel_types::EXTENDED_PROPERTIES, "docProps/app.xml");
    package.set_xml_part("_rels/.rels", &root_rels.to_element())?;

    put(&mut package, &mut types, "docProps/core.xml", ct::CORE_PROPERTIES, CORE_PROPS.to_string());
    put(&mut package, &mut types, "docProps/app.xml", ct::EXTENDED_PROPERTIES, APP_PROPS.to_string());

    let mut pres_rels = Relationships::new();
    let master_rel = pres_rels.add(rel_types::SLIDE_MASTER, "slideMasters/slideMaster1.xml");
    pres_rels.add(rel_types::PRES_PROPS, "presProps.xml");
    pres_rels.add(rel_types::VIEW_PROPS, "viewProps.xml");
    pres_rels.add(rel_types::THEME, "theme/theme1.xml");
    pres_rels.add(rel_types::TABLE_STYLES, "tableStyles.xml");
    package.set_xml_part("ppt/_rels/presentation.xml.rels", &pres_rels.to_element())?;

    put(&mut package, &mut types, "ppt/presentation.xml", ct::PRESENTATION, presentation_xml(&master_rel));
    put(&mut package, &mut types, "ppt/presProps.xml", ct::PRES_PROPS, PRES_PROPS.to_string());
    put(&mut package, &mut types, "ppt/viewProps.xml", ct::VIEW_PROPS, VIEW_PROPS.to_string());
    put(&mut package, &mut types, "ppt/tableStyles.xml", ct::TABLE_STYLES, TABLE_STYLES.to_string());
    put(&mut package, &mut types, "ppt/theme/theme1.xml", ct::THEME, THEME.to_string());

    let mut master_rels = Relationships::new();
    let mut layout_ids = Vec::with_capacity(LAYOUTS.len());
    for (index, layout) in LAYOUTS.iter().enumerate() {
        let number = index + 1;
        let part = format!("ppt/slideLayouts/slideLayout{}.xml", number);
        put(&mut package, &mut types, &part, ct::SLIDE_LAYOUT, layout_xml(layout));

        let mut layout_rels = Relationships::new();
        layout_rels.add(rel_types::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
        package.set_xml_part(
            format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", number),
            &layout_rels.to_element(),
        )?;

        let rel = master_rels.add(
            rel_types::SLIDE_LAYOUT,
            format!("../slideLayouts/slideLayout{}.xml", number),
        );
        layout_ids.push(rel);
    }
    master_rels.add(rel_types::THEME, "../theme/theme1.xml");
    package.set_xml_part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &master_rels.to_element(),
    )?;
    put(
        &mut package,
        &mut types,
        "ppt/slideMasters/slideMaster1.xml",
        ct::SLIDE_MASTER,
        master_xml(&layout_ids),
    );

    package.set_xml_part(CONTENT_TYPES_PART, types.element())?;
    Ok(package)
}

fn put(package: &mut Package, types: &mut ContentTypes, part: &str, content_type: &str, xml: String) {
    types.add_override(part, content_type);
    package.set_part(part, format!("{}{}", XML_DECL, xml).into_bytes());
}

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

fn namespaces() -> String {
    format!(r#"xmlns:a="{}" xmlns:r="{}" xmlns:p="{}""#, NS_A, NS_R, NS_P)
}

fn presentation_xml(master_rel: &str) -> String {
    format!(
        r#"<p:presentation {ns} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="{rel}"/></p:sldMasterIdLst><p:sldSz cx="{w}" cy="{h}" type="screen4x3"/><p:notesSz cx="{h}" cy="{w}"/><p:defaultTextStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr><a:lvl1pPr marL="0" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:defaultTextStyle></p:presentation>"#,
        ns = namespaces(),
        rel = master_rel,
        w = SLIDE_WIDTH,
        h = SLIDE_HEIGHT,
    )
}

const GROUP_PROPERTIES: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn placeholder_xml(id: usize, placeholder: &Placeholder) -> String {
    let mut ph_attrs = String::new();
    if let Some(ph_type) = placeholder.ph_type {
        ph_attrs.push_str(&format!(r#" type="{}""#, ph_type));
    }
    if placeholder.vertical {
        ph_attrs.push_str(r#" orient="vert""#);
    }
    if let Some(idx) = placeholder.idx {
        ph_attrs.push_str(&format!(r#" idx="{}""#, idx));
    }
    let body_attrs = if placeholder.vertical { r#" vert="eaVert""# } else { "" };
    let (x, y, cx, cy) = placeholder.frame;

    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph{ph_attrs}/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></p:spPr><p:txBody><a:bodyPr{body_attrs}/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
        name = placeholder.name,
    )
}

fn shape_tree<'a>(placeholders: impl Iterator<Item = &'a Placeholder>) -> String {
    let shapes: String = placeholders
        .enumerate()
        .map(|(i, placeholder)| placeholder_xml(i + 2, placeholder))
        .collect();
    format!("<p:spTree>{}{}</p:spTree>", GROUP_PROPERTIES, shapes)
}

fn layout_xml(layout: &Layout) -> String {
    format!(
        r#"<p:sldLayout {ns} type="{kind}" preserve="1"><p:cSld name="{name}">{tree}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        ns = namespaces(),
        kind = layout.layout_type,
        name = layout.name,
        tree = shape_tree(layout.placeholders.iter().chain(FOOTERS)),
    )
}

fn master_xml(layout_rels: &[String]) -> String {
    let master_placeholders = [
        ph("Title Placeholder 1", "title", TITLE),
        typed("Text Placeholder 2", "body", 1, BODY),
    ];
    let layout_ids: String = layout_rels
        .iter()
        .enumerate()
        .map(|(i, rel)| {
            format!(
                r#"<p:sldLayoutId id="{}" r:id="{}"/>"#,
                FIRST_LAYOUT_ID + i as u64,
                rel
            )
        })
        .collect();

    format!(
        r#"<p:sldMaster {ns}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>{tree}</p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst>{layout_ids}</p:sldLayoutIdLst>{styles}</p:sldMaster>"#,
        ns = namespaces(),
        tree = shape_tree(master_placeholders.iter().chain(FOOTERS)),
        styles = TEXT_STYLES,
    )
}

const TEXT_STYLES: &str = r#"<p:txStyles><p:titleStyle><a:lvl1pPr algn="ctr" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:spcBef><a:spcPct val="0"/></a:spcBef><a:buNone/><a:defRPr sz="4400" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/><a:ea typeface="+mj-ea"/><a:cs typeface="+mj-cs"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr marL="342900" indent="-342900" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:spcBef><a:spcPct val="20000"/></a:spcBef><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/><a:defRPr sz="3200" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr><a:lvl2pPr marL="742950" indent="-285750" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:spcBef><a:spcPct val="20000"/></a:spcBef><a:buFont typeface="Arial"/><a:buChar char="&#8211;"/><a:defRPr sz="2800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl2pPr></p:bodyStyle><p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr><a:lvl1pPr marL="0" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:otherStyle></p:txStyles>"#;

const CORE_PROPS: &str = r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>Presentation</dc:title><dc:creator>powerpoint-mcp</dc:creator></cp:coreProperties>"#;

const APP_PROPS: &str = r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>powerpoint-mcp</Application><PresentationFormat>On-screen Show (4:3)</PresentationFormat></Properties>"#;

const PRES_PROPS: &str = r#"<p:presentationPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#;

const VIEW_PROPS: &str = r#"<p:viewPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#;

const TABLE_STYLES: &str = r#"<a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}"/>"#;

const THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="50000"/></a:schemeClr></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:shade val="80000"/></a:schemeClr></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="95000"/></a:schemeClr></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:shade val="90000"/></a:schemeClr></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_part_is_well_formed_xml() {
        let package = new_presentation().unwrap();
        for name in package.part_names() {
            assert!(package.xml_part(name).is_ok(), "{name} does not parse");
        }
    }

    #[test]
    fn test_every_xml_part_has_a_content_type() {
        let package = new_presentation().unwrap();
        let types = ContentTypes::from_element(package.xml_part(CONTENT_TYPES_PART).unwrap());
        for name in package.part_names().filter(|n| *n != CONTENT_TYPES_PART) {
            assert!(types.content_type(name).is_some(), "{name} has no content type");
        }
        assert_eq!(
            types.content_type("ppt/presentation.xml"),
            Some(ct::PRESENTATION)
        );
    }

    #[test]
    fn test_master_lists_every_layout() {
        let package = new_presentation().unwrap();
        let master = package.xml_part("ppt/slideMasters/slideMaster1.xml").unwrap();
        let ids = master.child("sldLayoutIdLst").unwrap().children_named("sldLayoutId").count();
        assert_eq!(ids, layout_count());

        let rels = package.relationships("ppt/slideMasters/slideMaster1.xml").unwrap();
        assert_eq!(rels.len(), layout_count() + 1);
        assert!(rels.first_of_kind("theme").is_some());
    }

    #[test]
    fn test_blank_layout_only_has_footers() {
        let package = new_presentation().unwrap();
        let blank = package.xml_part("ppt/slideLayouts/slideLayout7.xml").unwrap();
        assert_eq!(blank.attr("type"), Some("blank"));
        let tree = blank.find(&["cSld", "spTree"]).unwrap();
        assert_eq!(tree.children_named("sp").count(), FOOTERS.len());
    }
}
