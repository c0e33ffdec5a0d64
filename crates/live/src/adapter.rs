//! `PowerPointAdapter` driving a running PowerPoint through automation.

use crate::dispatch::{Connector, Dispatch, DispatchExt, Variant};
use ppt_mcp_core::{
    checked_position, parse_id, resolve_title, shape_type, AdapterKind, AddedShape, Confirmation,
    Error, HandleTable, IndexKind, PowerPointAdapter, PresentationInfo, Rect, Result,
    SavedPresentation, SelectedShape, Selection, ShapeText, SlideInfo, SlideRef, SlideText,
    TitleCandidate, NEW_PRESENTATION_NAME, NEW_SLIDE_TITLE,
};
use std::collections::BTreeMap;
use std::path::Path;

/// `PpPlaceholderType` codes that mark a slide title.
const PLACEHOLDER_TITLE: i64 = 1;
const PLACEHOLDER_CENTER_TITLE: i64 = 3;

/// `msoTextOrientationHorizontal`.
const ORIENTATION_HORIZONTAL: i64 = 1;

/// `PpSelectionType` values that carry a shape range.
const SELECTION_SHAPES: i64 = 2;
const SELECTION_TEXT: i64 = 3;

/// `msoShapeTypeMixed`, reported when the type cannot be read.
const SHAPE_TYPE_MIXED: i32 = -2;

const UNNAMED_SHAPE: &str = "Unnamed Shape";
const UNTITLED_PRESENTATION: &str = "Untitled";

fn shape_kind<D: Dispatch>(shape: &D) -> Option<i32> {
    shape.int("Type").ok().and_then(|code| i32::try_from(code).ok())
}

fn is_title_placeholder<D: Dispatch>(shape: &D) -> bool {
    shape_kind(shape) == Some(shape_type::PLACEHOLDER)
        && matches!(
            shape.path(&["PlaceholderFormat"]).and_then(|format| format.int("Type")),
            Ok(PLACEHOLDER_TITLE | PLACEHOLDER_CENTER_TITLE)
        )
}

/// Title resolution view of a live shape.
struct LiveShape<D>(D);

impl<D: Dispatch> TitleCandidate for LiveShape<D> {
    fn is_title_placeholder(&self) -> bool {
        is_title_placeholder(&self.0)
    }

    fn is_text_box(&self) -> bool {
        shape_kind(&self.0) == Some(shape_type::TEXT_BOX)
    }

    fn text(&self) -> Option<String> {
        self.0
            .path(&["TextFrame", "TextRange"])
            .and_then(|range| range.text("Text"))
            .ok()
    }
}

type TextStrategy<D> = fn(&D) -> Option<String>;

fn frame_text<D: Dispatch>(shape: &D, frame: &str) -> Option<String> {
    let frame = shape.object(frame).ok()?;
    if !frame.flag("HasText").ok()? {
        return None;
    }
    frame.object("TextRange").and_then(|range| range.text("Text")).ok()
}

fn modern_frame_text<D: Dispatch>(shape: &D) -> Option<String> {
    frame_text(shape, "TextFrame2")
}

fn legacy_frame_text<D: Dispatch>(shape: &D) -> Option<String> {
    frame_text(shape, "TextFrame")
}

fn legacy_range_text<D: Dispatch>(shape: &D) -> Option<String> {
    shape
        .path(&["TextFrame", "TextRange"])
        .and_then(|range| range.text("Text"))
        .ok()
        .filter(|text| !text.trim().is_empty())
}

/// Text of a shape, trying the modern frame first. Shapes without any
/// readable text yield `None`.
fn shape_text<D: Dispatch>(shape: &D) -> Option<String> {
    let strategies: [TextStrategy<D>; 3] = [
        modern_frame_text::<D>,
        legacy_frame_text::<D>,
        legacy_range_text::<D>,
    ];
    strategies.iter().find_map(|strategy| strategy(shape))
}

/// The text range a write should go to.
fn writable_range<D: Dispatch>(shape: &D) -> Option<D> {
    let modern = shape
        .object("TextFrame2")
        .ok()
        .filter(|frame| frame.flag("HasText").unwrap_or(false))
        .and_then(|frame| frame.object("TextRange").ok());
    modern.or_else(|| shape.path(&["TextFrame", "TextRange"]).ok())
}

/// Like [`writable_range`], descending into group members.
fn editable_range<D: Dispatch>(shape: &D) -> Option<D> {
    writable_range(shape).or_else(|| {
        if shape_kind(shape)? != shape_type::GROUP {
            return None;
        }
        let members = shape.object("GroupItems").and_then(|items| items.items()).ok()?;
        members.iter().find_map(|member| writable_range(member))
    })
}

fn base_name(full_name: &str) -> &str {
    full_name
        .rsplit(|c| c == '\\' || c == '/')
        .next()
        .unwrap_or(full_name)
}

fn describe<D: Dispatch>(id: &str, presentation: &D) -> Result<PresentationInfo> {
    let full_name = presentation.text("FullName")?;
    let name = match base_name(&full_name) {
        "" => UNTITLED_PRESENTATION.to_string(),
        name => name.to_string(),
    };
    Ok(PresentationInfo {
        id: id.to_string(),
        name,
        path: full_name,
        slide_count: presentation.object("Slides")?.count()?,
    })
}

/// Resolve a raw 1-based slide ID against the presentation.
fn slide_at<D: Dispatch>(presentation: &D, raw: &str) -> Result<(usize, D)> {
    let id = parse_id(raw)?;
    let slides = presentation.object("Slides")?;
    let index = checked_position(IndexKind::Slide, raw, id, slides.count()?)?;
    Ok((index, slides.item(index)?))
}

fn list_slides<D: Dispatch>(presentation: &D) -> Result<Vec<SlideInfo>> {
    let slides = presentation.object("Slides")?.items()?;
    let mut infos = Vec::with_capacity(slides.len());
    for (offset, slide) in slides.iter().enumerate() {
        let shapes: Vec<LiveShape<D>> = slide
            .object("Shapes")?
            .items()?
            .into_iter()
            .map(LiveShape)
            .collect();
        infos.push(SlideInfo::new(offset + 1, resolve_title(&shapes), shapes.len()));
    }
    Ok(infos)
}

fn append_slide<D: Dispatch>(presentation: &D, layout_type: i32) -> Result<SlideInfo> {
    let slides = presentation.object("Slides")?;
    let index = slides.count()? + 1;
    let slide = slides.call_object(
        "Add",
        &[Variant::Int(index as i64), Variant::Int(i64::from(layout_type))],
    )?;
    let shape_count = slide.object("Shapes")?.count()?;
    Ok(SlideInfo::new(index, NEW_SLIDE_TITLE, shape_count))
}

fn read_slide_text<D: Dispatch>(presentation: &D, slide: i64) -> Result<SlideText> {
    let slides = presentation.object("Slides")?;
    let slide_count = slides.count()?;
    if slide_count == 0 {
        return Err(Error::NoSlides);
    }
    let index = checked_position(IndexKind::Slide, &slide.to_string(), slide, slide_count)?;
    let shapes = slides.item(index)?.object("Shapes")?;
    let shape_count = shapes.count()?;

    let mut content = BTreeMap::new();
    for position in 1..=shape_count {
        // Shapes that refuse to answer are skipped, not fatal.
        let Ok(shape) = shapes.item(position) else {
            continue;
        };
        let Some(text) = shape_text(&shape) else {
            continue;
        };
        let shape_name = shape
            .text("Name")
            .unwrap_or_else(|_| UNNAMED_SHAPE.to_string());
        content.insert(position, ShapeText { shape_name, text });
    }

    Ok(SlideText {
        slide_id: index,
        slide_index: index,
        slide_count,
        shape_count,
        content,
    })
}

fn write_shape_text<D: Dispatch>(
    presentation: &D,
    slide: &str,
    shape: &str,
    text: &str,
) -> Result<Confirmation> {
    let shape_id = parse_id(shape)?;
    let (_, slide) = slide_at(presentation, slide)?;
    let shapes = slide.object("Shapes")?;
    let position = checked_position(IndexKind::Shape, shape, shape_id, shapes.count()?)?;
    let target = shapes.item(position)?;
    let range = editable_range(&target)
        .ok_or_else(|| Error::NotEditable("Shape does not contain editable text".to_string()))?;
    range.put("Text", Variant::from(text))?;
    Ok(Confirmation::new("Text updated successfully"))
}

fn insert_text_box<D: Dispatch>(
    presentation: &D,
    slide: &str,
    text: &str,
    rect: Rect,
) -> Result<AddedShape> {
    let (index, slide) = slide_at(presentation, slide)?;
    let shapes = slide.object("Shapes")?;
    let shape = add_textbox(&shapes, rect)?;
    shape.path(&["TextFrame", "TextRange"])?.put("Text", Variant::from(text))?;

    // The new shape is usually last, but z-order is not guaranteed.
    let count = shapes.count()?;
    let position = (1..=count)
        .find(|&i| shapes.item(i).map(|s| s.is_same(&shape)).unwrap_or(false))
        .unwrap_or(count);
    Ok(AddedShape::new(index, position))
}

fn add_textbox<D: Dispatch>(shapes: &D, rect: Rect) -> Result<D> {
    Ok(shapes.call_object(
        "AddTextbox",
        &[
            Variant::Int(ORIENTATION_HORIZONTAL),
            Variant::Float(rect.left),
            Variant::Float(rect.top),
            Variant::Float(rect.width),
            Variant::Float(rect.height),
        ],
    )?)
}

fn write_title<D: Dispatch>(presentation: &D, slide: &str, title: &str) -> Result<Confirmation> {
    let (_, slide) = slide_at(presentation, slide)?;
    let shapes = slide.object("Shapes")?;
    let placeholder = shapes
        .items()?
        .into_iter()
        .find(|shape| is_title_placeholder(shape))
        .and_then(|shape| shape.path(&["TextFrame", "TextRange"]).ok());

    match placeholder {
        Some(range) => range.put("Text", Variant::from(title))?,
        None => {
            let shape = add_textbox(&shapes, Rect::new(50.0, 50.0, 600.0, 50.0))?;
            let range = shape.path(&["TextFrame", "TextRange"])?;
            range.put("Text", Variant::from(title))?;
            let font = range.object("Font")?;
            font.put("Size", Variant::Float(44.0))?;
            font.put("Bold", Variant::Bool(true))?;
        }
    }
    Ok(Confirmation::new("Slide title has been set"))
}

fn describe_selected<D: Dispatch>(
    shape: &D,
    slide_shapes: &[D],
    selected_text: Option<String>,
) -> SelectedShape {
    let shape_name = shape.text("Name").unwrap_or_default();
    let shape_id = slide_shapes
        .iter()
        .position(|candidate| {
            candidate.is_same(shape)
                || (!shape_name.is_empty()
                    && candidate.text("Name").ok().as_deref() == Some(shape_name.as_str()))
        })
        .map(|offset| (offset + 1).to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let code = shape_kind(shape).unwrap_or(SHAPE_TYPE_MIXED);

    SelectedShape {
        shape_id,
        shape_name,
        shape_type: code,
        shape_type_name: shape_type::name(code),
        is_text_box: code == shape_type::TEXT_BOX,
        text: shape_text(shape).unwrap_or_default(),
        selected_text,
    }
}

fn read_selection<D: Dispatch>(app: &D, presentation_id: String) -> Result<Selection> {
    let window = app.object("ActiveWindow")?;
    let selection = window.object("Selection")?;
    let kind = selection.int("Type")?;

    let slide = window.path(&["View", "Slide"]).ok();
    let slide_ref = slide
        .as_ref()
        .and_then(|slide| slide.int("SlideIndex").ok())
        .and_then(|index| usize::try_from(index).ok())
        .map(|index| SlideRef {
            id: index.to_string(),
            index,
        });
    let slide_shapes = slide
        .as_ref()
        .and_then(|slide| slide.object("Shapes").and_then(|shapes| shapes.items()).ok())
        .unwrap_or_default();

    let selected_shapes = match kind {
        SELECTION_SHAPES => selection
            .object("ShapeRange")?
            .items()?
            .iter()
            .map(|shape| describe_selected(shape, &slide_shapes, None))
            .collect::<Vec<_>>(),
        SELECTION_TEXT => {
            let shape = selection.object("ShapeRange")?.item(1)?;
            let selected_text = selection
                .object("TextRange")
                .and_then(|range| range.text("Text"))
                .ok();
            vec![describe_selected(&shape, &slide_shapes, selected_text)]
        }
        _ => Vec::new(),
    };

    let message = selected_shapes
        .is_empty()
        .then(|| "No shapes are currently selected".to_string());
    Ok(Selection {
        presentation_id,
        slide: slide_ref,
        selected_shapes,
        message,
    })
}

/// Live backend: talks to `PowerPoint.Application` through a [`Connector`].
pub struct LiveAdapter<C: Connector> {
    connector: C,
    app: Option<C::Object>,
    presentations: HandleTable<C::Object>,
}

impl<C: Connector> LiveAdapter<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            app: None,
            presentations: HandleTable::new(),
        }
    }

    /// The application object, connecting on first use.
    fn application(&mut self) -> Result<C::Object> {
        if self.app.is_none() {
            self.initialize();
        }
        self.app
            .clone()
            .ok_or_else(|| Error::Automation("Could not connect to PowerPoint.Application".into()))
    }

    fn presentation(&self, id: &str) -> Result<C::Object> {
        self.presentations.get(id).cloned()
    }

    /// Handle for an application-side presentation, reusing a known one.
    fn handle_for(&mut self, presentation: &C::Object) -> String {
        match self.presentations.find(|known| known.is_same(presentation)) {
            Some(id) => id.to_string(),
            None => self.presentations.insert(presentation.clone()),
        }
    }
}

impl<C: Connector> PowerPointAdapter for LiveAdapter<C> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::LiveAutomation
    }

    fn is_available(&self) -> bool {
        self.connector.is_available()
    }

    fn initialize(&mut self) -> bool {
        if !self.connector.is_available() {
            log::debug!("PowerPoint automation is not available on this host");
            return false;
        }
        match self.connector.attach() {
            Ok(app) => {
                log::info!("Attached to running PowerPoint instance");
                self.app = Some(app);
                true
            }
            Err(err) => {
                log::debug!("No running PowerPoint ({}), starting one", err);
                let launched = self.connector.launch().and_then(|app| {
                    app.put("Visible", Variant::Bool(true))?;
                    Ok(app)
                });
                match launched {
                    Ok(app) => {
                        log::info!("Started new PowerPoint instance");
                        self.app = Some(app);
                        true
                    }
                    Err(err) => {
                        log::warn!("Failed to start PowerPoint: {}", err);
                        false
                    }
                }
            }
        }
    }

    fn open_presentations(&mut self) -> Result<Vec<PresentationInfo>> {
        let app = self.application()?;
        let open = app
            .object("Presentations")
            .and_then(|presentations| presentations.items())
            .map_err(|e| Error::operation("listing presentations", e.into()))?;

        let mut infos = Vec::with_capacity(open.len());
        for presentation in open {
            let id = self.handle_for(&presentation);
            infos.push(
                describe(&id, &presentation)
                    .map_err(|e| Error::operation("listing presentations", e))?,
            );
        }
        Ok(infos)
    }

    fn open_presentation(&mut self, path: &Path) -> Result<PresentationInfo> {
        let app = self.application()?;
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let path = std::path::absolute(path)?;
        let presentation = app
            .object("Presentations")
            .and_then(|presentations| {
                presentations.call_object("Open", &[Variant::Text(path.display().to_string())])
            })
            .map_err(|e| Error::operation("opening presentation", e.into()))?;
        let slide_count = presentation
            .object("Slides")
            .and_then(|slides| slides.count())
            .map_err(|e| Error::operation("opening presentation", e.into()))?;

        let id = self.handle_for(&presentation);
        log::info!("Opened presentation {} from {}", id, path.display());
        Ok(PresentationInfo {
            id,
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
            slide_count,
        })
    }

    fn create_presentation(&mut self) -> Result<PresentationInfo> {
        let app = self.application()?;
        let presentation = app
            .object("Presentations")
            .and_then(|presentations| presentations.call_object("Add", &[]))
            .map_err(|e| Error::operation("creating presentation", e.into()))?;
        let slide_count = presentation
            .object("Slides")
            .and_then(|slides| slides.count())
            .map_err(|e| Error::operation("creating presentation", e.into()))?;

        let id = self.handle_for(&presentation);
        log::info!("Created presentation {}", id);
        Ok(PresentationInfo {
            id,
            name: NEW_PRESENTATION_NAME.to_string(),
            path: String::new(),
            slide_count,
        })
    }

    fn save_presentation(&mut self, id: &str, path: Option<&Path>) -> Result<SavedPresentation> {
        let presentation = self.presentation(id)?;
        let saved = match path {
            Some(path) => {
                let target = std::path::absolute(path)?.display().to_string();
                presentation
                    .call("SaveAs", &[Variant::Text(target.clone())])
                    .map_err(|e| Error::operation("saving presentation", e.into()))?;
                target
            }
            None => presentation
                .call("Save", &[])
                .and_then(|_| presentation.text("FullName"))
                .map_err(|e| Error::operation("saving presentation", e.into()))?,
        };
        log::info!("Saved presentation {} to {}", id, saved);
        Ok(SavedPresentation::new(saved))
    }

    fn close_presentation(&mut self, id: &str, save: bool) -> Result<()> {
        let presentation = self.presentation(id)?;
        if save {
            let saved = presentation
                .flag("Saved")
                .map_err(|e| Error::operation("closing presentation", e.into()))?;
            if !saved {
                self.save_presentation(id, None)
                    .map_err(|e| Error::SaveBeforeClose(Box::new(e)))?;
            }
        }
        presentation
            .call("Close", &[])
            .map_err(|e| Error::operation("closing presentation", e.into()))?;
        self.presentations.remove(id)?;
        log::info!("Closed presentation {}", id);
        Ok(())
    }

    fn slides(&mut self, id: &str) -> Result<Vec<SlideInfo>> {
        let presentation = self.presentation(id)?;
        list_slides(&presentation).map_err(|e| Error::operation("getting slides", e))
    }

    fn add_slide(&mut self, id: &str, layout_type: i32) -> Result<SlideInfo> {
        let presentation = self.presentation(id)?;
        append_slide(&presentation, layout_type).map_err(|e| Error::operation("adding slide", e))
    }

    fn slide_text(&mut self, id: &str, slide: i64) -> Result<SlideText> {
        let presentation = self.presentation(id)?;
        read_slide_text(&presentation, slide).map_err(|e| Error::operation("getting slide text", e))
    }

    fn update_text(
        &mut self,
        id: &str,
        slide: &str,
        shape: &str,
        text: &str,
    ) -> Result<Confirmation> {
        let presentation = self.presentation(id)?;
        write_shape_text(&presentation, slide, shape, text)
            .map_err(|e| Error::operation("updating text", e))
    }

    fn add_text_box(
        &mut self,
        id: &str,
        slide: &str,
        text: &str,
        rect: Rect,
    ) -> Result<AddedShape> {
        let presentation = self.presentation(id)?;
        insert_text_box(&presentation, slide, text, rect)
            .map_err(|e| Error::operation("adding text box", e))
    }

    fn set_slide_title(&mut self, id: &str, slide: &str, title: &str) -> Result<Confirmation> {
        let presentation = self.presentation(id)?;
        write_title(&presentation, slide, title)
            .map_err(|e| Error::operation("setting slide title", e))
    }

    fn selected_shapes(&mut self, id: Option<&str>) -> Result<Selection> {
        let app = self.application()?;
        let requested = id.map(|id| self.presentation(id)).transpose()?;
        let active = app
            .path(&["ActiveWindow", "Presentation"])
            .map_err(|e| Error::operation("reading selection", e.into()))?;
        let presentation_id = match (id, requested) {
            (Some(id), Some(requested)) => {
                if !requested.is_same(&active) {
                    return Err(Error::NotActive(id.to_string()));
                }
                id.to_string()
            }
            _ => self.handle_for(&active),
        };
        read_selection(&app, presentation_id).map_err(|e| Error::operation("reading selection", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{
        application, group, picture, placeholder, presentation, slide, text_shape,
        FakeConnector, FakeObject,
    };
    use ppt_mcp_core::ResponseStyle;
    use serde_json::json;

    fn adapter_with(decks: Vec<FakeObject>) -> (LiveAdapter<FakeConnector>, FakeObject) {
        let app = application();
        let collection = app.child("Presentations");
        for deck in decks {
            collection.push(deck);
        }
        let mut adapter = LiveAdapter::new(FakeConnector::running(app.clone()));
        assert!(adapter.initialize());
        (adapter, app)
    }

    fn first_id(adapter: &mut LiveAdapter<FakeConnector>) -> String {
        adapter.open_presentations().unwrap()[0].id.clone()
    }

    fn shapes_of(deck: &FakeObject, slide: usize) -> FakeObject {
        deck.child("Slides").item_at(slide).child("Shapes")
    }

    fn range_text(shape: &FakeObject) -> String {
        shape
            .child("TextFrame")
            .child("TextRange")
            .prop_text("Text")
            .unwrap_or_default()
    }

    #[test]
    fn test_initialize_attaches_to_running_instance() {
        let (adapter, app) = adapter_with(Vec::new());
        assert_eq!(adapter.kind().type_name(), "WindowsCOMAdapter");
        assert_eq!(app.prop("Visible").and_then(|v| v.as_bool()), Some(false));
    }

    #[test]
    fn test_initialize_launches_visible_instance() {
        let app = application();
        let mut adapter = LiveAdapter::new(FakeConnector {
            available: true,
            running: None,
            launchable: Some(app.clone()),
        });
        assert!(adapter.initialize());
        assert_eq!(app.prop("Visible").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_initialize_reports_failure() {
        let mut adapter = LiveAdapter::new(FakeConnector::default());
        assert!(!adapter.is_available());
        assert!(!adapter.initialize());

        let mut adapter = LiveAdapter::new(FakeConnector {
            available: true,
            ..FakeConnector::default()
        });
        assert!(!adapter.initialize());
        let err = adapter.open_presentations().unwrap_err();
        assert!(matches!(err, Error::Automation(_)));
    }

    #[test]
    fn test_listing_reuses_handles() {
        let deck = presentation("C:\\decks\\q3.pptx", vec![slide(Vec::new()), slide(Vec::new())]);
        let (mut adapter, _app) = adapter_with(vec![deck, presentation("", Vec::new())]);

        let first = adapter.open_presentations().unwrap();
        let second = adapter.open_presentations().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, first[1].id);
        assert_eq!(first[0].name, "q3.pptx");
        assert_eq!(first[0].path, "C:\\decks\\q3.pptx");
        assert_eq!(first[0].slide_count, 2);
        assert_eq!(first[1].name, "Untitled");
    }

    #[test]
    fn test_created_presentation_keeps_its_handle_when_listed() {
        let (mut adapter, _app) = adapter_with(Vec::new());
        let created = adapter.create_presentation().unwrap();
        assert_eq!(created.name, "New Presentation");
        assert_eq!(created.path, "");

        let listed = adapter.open_presentations().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[test]
    fn test_open_missing_file() {
        let (mut adapter, _app) = adapter_with(Vec::new());
        let err = adapter
            .open_presentation(Path::new("/definitely/not/here.pptx"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_slide_titles_follow_strategy_order() {
        let deck = presentation(
            "deck.pptx",
            vec![
                slide(vec![
                    placeholder("Title 1", PLACEHOLDER_TITLE, "Agenda"),
                    text_shape("TextBox 2", 17, "note"),
                ]),
                slide(vec![
                    placeholder("Content 1", 2, "body text"),
                    text_shape("TextBox 2", 17, "caption"),
                ]),
                slide(vec![picture("Logo"), placeholder("Content 1", 2, "first words")]),
                slide(vec![picture("Logo")]),
            ],
        );
        let (mut adapter, _app) = adapter_with(vec![deck]);
        let id = first_id(&mut adapter);

        let titles: Vec<String> = adapter
            .slides(&id)
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, ["Agenda", "caption", "first words", "Untitled Slide"]);
    }

    #[test]
    fn test_slide_text_prefers_modern_frame() {
        let frame = |text: &str, has_text: bool| {
            FakeObject::new("TextFrame")
                .with("HasText", has_text)
                .with_object("TextRange", FakeObject::new("TextRange").with("Text", text))
        };
        let both = FakeObject::new("Shape")
            .with("Name", "Both")
            .with("Type", 1_i64)
            .with_object("TextFrame2", frame("modern", true))
            .with_object("TextFrame", frame("legacy", true));
        let legacy = FakeObject::new("Shape")
            .with("Name", "Legacy")
            .with("Type", 1_i64)
            .failing("TextFrame2")
            .with_object("TextFrame", frame("legacy", true));
        let range_only = FakeObject::new("Shape")
            .with("Type", 1_i64)
            .failing("Name")
            .failing("TextFrame2")
            .with_object("TextFrame", frame("fallback", false));
        let blank = text_shape("Blank", 17, "");

        let deck = presentation(
            "deck.pptx",
            vec![slide(vec![both, legacy, range_only, blank, picture("Logo")])],
        );
        let (mut adapter, _app) = adapter_with(vec![deck]);
        let id = first_id(&mut adapter);

        let text = adapter.slide_text(&id, 1).unwrap();
        assert_eq!(text.shape_count, 5);
        assert_eq!(text.content.len(), 3);
        assert_eq!(text.content[&1].text, "modern");
        assert_eq!(text.content[&2].text, "legacy");
        assert_eq!(text.content[&3].text, "fallback");
        assert_eq!(text.content[&3].shape_name, "Unnamed Shape");
    }

    #[test]
    fn test_slide_text_on_empty_deck() {
        let (mut adapter, _app) = adapter_with(vec![presentation("deck.pptx", Vec::new())]);
        let id = first_id(&mut adapter);
        assert!(matches!(adapter.slide_text(&id, 1), Err(Error::NoSlides)));
    }

    #[test]
    fn test_update_text_reaches_into_groups() {
        let inner = text_shape("Inner", 17, "old");
        let deck = presentation(
            "deck.pptx",
            vec![slide(vec![
                group("Group 1", vec![picture("Pic"), inner.clone()]),
                text_shape("Empty", 17, ""),
            ])],
        );
        let (mut adapter, _app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        let done = adapter.update_text(&id, "1", "1", "new").unwrap();
        assert_eq!(done.message, "Text updated successfully");
        assert_eq!(range_text(&inner), "new");

        adapter.update_text(&id, "1", "2", "filled").unwrap();
        assert_eq!(range_text(&shapes_of(&deck, 0).item_at(1)), "filled");
    }

    #[test]
    fn test_update_text_on_picture_is_not_editable() {
        let deck = presentation("deck.pptx", vec![slide(vec![picture("Logo")])]);
        let (mut adapter, _app) = adapter_with(vec![deck]);
        let id = first_id(&mut adapter);

        let err = adapter.update_text(&id, "1", "1", "x").unwrap_err();
        assert_eq!(
            err.to_response(ResponseStyle::Outcome),
            json!({ "success": false, "message": "Shape does not contain editable text" })
        );
    }

    #[test]
    fn test_ids_are_parsed_and_range_checked() {
        let deck = presentation(
            "deck.pptx",
            vec![
                slide(vec![text_shape("A", 17, "one")]),
                slide(vec![text_shape("B", 17, "two")]),
            ],
        );
        let (mut adapter, _app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        adapter.update_text(&id, "\"2\"", "'1'", "changed").unwrap();
        assert_eq!(range_text(&shapes_of(&deck, 1).item_at(0)), "changed");

        let err = adapter.update_text(&id, "3", "1", "x").unwrap_err();
        assert_eq!(err.to_string(), "Invalid slide ID: 3. Valid range is 1-2");
        let err = adapter.update_text(&id, "1", "9", "x").unwrap_err();
        assert_eq!(err.to_string(), "Invalid shape ID: 9. Valid range is 1-1");
        assert!(matches!(
            adapter.update_text(&id, "one", "1", "x"),
            Err(Error::InvalidIdFormat(_))
        ));
        assert!(matches!(
            adapter.slide_text(&id, 0),
            Err(Error::SlideOutOfRange { .. })
        ));
        assert!(matches!(
            adapter.slides("nope"),
            Err(Error::PresentationNotFound(_))
        ));
    }

    #[test]
    fn test_add_text_box_reports_its_position() {
        let deck = presentation(
            "deck.pptx",
            vec![slide(vec![text_shape("A", 17, "one"), picture("Logo")])],
        );
        let (mut adapter, _app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        let added = adapter
            .add_text_box(&id, "1", "hello", Rect::default())
            .unwrap();
        assert_eq!(added.slide_id, "1");
        assert_eq!(added.shape_id, "3");

        let shape = shapes_of(&deck, 0).item_at(2);
        assert!(matches!(shape.prop("Left"), Some(Variant::Float(x)) if x == 100.0));
        assert!(matches!(shape.prop("Width"), Some(Variant::Float(x)) if x == 400.0));
        assert_eq!(adapter.slide_text(&id, 1).unwrap().content[&3].text, "hello");
    }

    #[test]
    fn test_set_title_uses_placeholder() {
        let title = placeholder("Title 1", PLACEHOLDER_CENTER_TITLE, "");
        let deck = presentation("deck.pptx", vec![slide(vec![title.clone()])]);
        let (mut adapter, _app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        let done = adapter.set_slide_title(&id, "1", "Roadmap").unwrap();
        assert_eq!(done.message, "Slide title has been set");
        assert_eq!(range_text(&title), "Roadmap");
        assert_eq!(shapes_of(&deck, 0).item_count(), 1);
        assert_eq!(adapter.slides(&id).unwrap()[0].title, "Roadmap");
    }

    #[test]
    fn test_set_title_falls_back_to_text_box() {
        let deck = presentation("deck.pptx", vec![slide(Vec::new())]);
        let (mut adapter, _app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        adapter.set_slide_title(&id, "1", "Roadmap").unwrap();
        let shapes = shapes_of(&deck, 0);
        assert_eq!(shapes.item_count(), 1);
        let shape = shapes.item_at(0);
        assert!(matches!(shape.prop("Left"), Some(Variant::Float(x)) if x == 50.0));
        assert!(matches!(shape.prop("Width"), Some(Variant::Float(x)) if x == 600.0));
        assert_eq!(range_text(&shape), "Roadmap");

        let font = shape.child("TextFrame").child("TextRange").child("Font");
        assert!(matches!(font.prop("Size"), Some(Variant::Float(x)) if x == 44.0));
        assert_eq!(font.prop("Bold").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_add_slide_appends() {
        let deck = presentation("deck.pptx", vec![slide(Vec::new())]);
        let (mut adapter, _app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        let added = adapter.add_slide(&id, 1).unwrap();
        assert_eq!(added.index, 2);
        assert_eq!(added.title, "New Slide");
        assert_eq!(added.shape_count, 2);

        let blank = adapter.add_slide(&id, 12).unwrap();
        assert_eq!(blank.index, 3);
        assert_eq!(blank.shape_count, 0);
        assert_eq!(deck.child("Slides").item_count(), 3);
    }

    #[test]
    fn test_save_as_reports_absolute_path() {
        let deck = presentation("", Vec::new());
        let (mut adapter, _app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        let target = std::env::temp_dir().join("out.pptx");
        let saved = adapter.save_presentation(&id, Some(&target)).unwrap();
        assert!(saved.success);
        assert_eq!(saved.path, target.display().to_string());
        assert_eq!(deck.prop_text("FullName").unwrap(), saved.path);
    }

    #[test]
    fn test_close_saves_dirty_presentation() {
        let deck = presentation("C:\\decks\\a.pptx", Vec::new()).with("Saved", false);
        let (mut adapter, app) = adapter_with(vec![deck.clone()]);
        let id = first_id(&mut adapter);

        adapter.close_presentation(&id, true).unwrap();
        assert_eq!(deck.prop("Saved").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(app.child("Presentations").item_count(), 0);
        assert!(matches!(
            adapter.close_presentation(&id, true),
            Err(Error::PresentationNotFound(_))
        ));
    }

    #[test]
    fn test_failed_save_keeps_presentation_open() {
        let deck = presentation("C:\\decks\\a.pptx", Vec::new())
            .with("Saved", false)
            .failing("Save");
        let (mut adapter, app) = adapter_with(vec![deck]);
        let id = first_id(&mut adapter);

        let err = adapter.close_presentation(&id, true).unwrap_err();
        assert!(matches!(err, Error::SaveBeforeClose(_)));
        assert!(err.to_string().starts_with("Failed to save before closing"));
        assert_eq!(app.child("Presentations").item_count(), 1);
        assert!(adapter.slides(&id).is_ok());

        adapter.close_presentation(&id, false).unwrap();
        assert_eq!(app.child("Presentations").item_count(), 0);
    }

    fn selection_app(kind: i64, selected: Vec<FakeObject>, text: Option<&str>) -> FakeObject {
        let current = slide(vec![text_shape("Title", 14, "Hello"), picture("Logo")])
            .with("SlideIndex", 2_i64);
        let deck = presentation("C:\\decks\\a.pptx", vec![slide(Vec::new()), current.clone()]);

        let mut selection = FakeObject::new("Selection")
            .with("Type", kind)
            .with_object("ShapeRange", FakeObject::new("ShapeRange").with_items(selected));
        if let Some(text) = text {
            selection = selection
                .with_object("TextRange", FakeObject::new("TextRange").with("Text", text));
        }

        let window = FakeObject::new("DocumentWindow")
            .with_object("Presentation", deck.clone())
            .with_object("View", FakeObject::new("View").with_object("Slide", current))
            .with_object("Selection", selection);
        let app = application().with_object("ActiveWindow", window);
        app.child("Presentations").push(deck);
        app
    }

    #[test]
    fn test_selected_shapes_are_described() {
        let logo = picture("Logo");
        let app = selection_app(SELECTION_SHAPES, vec![logo], None);
        let mut adapter = LiveAdapter::new(FakeConnector::running(app));

        let selection = adapter.selected_shapes(None).unwrap();
        assert_eq!(selection.presentation_id, first_id(&mut adapter));
        let slide = selection.slide.unwrap();
        assert_eq!(slide.index, 2);
        assert_eq!(slide.id, "2");
        assert_eq!(selection.selected_shapes.len(), 1);
        let shape = &selection.selected_shapes[0];
        // A different wrapper of the same shape is matched by name.
        assert_eq!(shape.shape_id, "2");
        assert_eq!(shape.shape_name, "Logo");
        assert_eq!(shape.shape_type, 13);
        assert_eq!(shape.shape_type_name, "msoPicture");
        assert!(!shape.is_text_box);
        assert_eq!(shape.text, "");
        assert!(selection.message.is_none());
    }

    #[test]
    fn test_text_selection_reports_selected_text() {
        let caret = text_shape("Title", 14, "Hello");
        let app = selection_app(SELECTION_TEXT, vec![caret], Some("ell"));
        let mut adapter = LiveAdapter::new(FakeConnector::running(app));

        let selection = adapter.selected_shapes(None).unwrap();
        let shape = &selection.selected_shapes[0];
        assert_eq!(shape.shape_id, "1");
        assert_eq!(shape.text, "Hello");
        assert_eq!(shape.selected_text.as_deref(), Some("ell"));
    }

    #[test]
    fn test_empty_selection_has_message() {
        let app = selection_app(0, Vec::new(), None);
        let mut adapter = LiveAdapter::new(FakeConnector::running(app));

        let selection = adapter.selected_shapes(None).unwrap();
        assert!(selection.selected_shapes.is_empty());
        assert_eq!(
            selection.message.as_deref(),
            Some("No shapes are currently selected")
        );
        assert!(matches!(
            adapter.selected_shapes(Some("nope")),
            Err(Error::PresentationNotFound(_))
        ));
    }

    #[test]
    fn test_selection_requires_the_active_presentation() {
        let app = selection_app(SELECTION_SHAPES, vec![picture("Logo")], None);
        let other = presentation("C:\\decks\\b.pptx", vec![slide(Vec::new())]);
        app.child("Presentations").push(other);
        let mut adapter = LiveAdapter::new(FakeConnector::running(app));

        let decks = adapter.open_presentations().unwrap();
        let active = decks.iter().find(|d| d.name == "a.pptx").unwrap().id.clone();
        let background = decks.iter().find(|d| d.name == "b.pptx").unwrap().id.clone();

        let selection = adapter.selected_shapes(Some(&active)).unwrap();
        assert_eq!(selection.presentation_id, active);
        assert_eq!(selection.selected_shapes.len(), 1);

        let err = adapter.selected_shapes(Some(&background)).unwrap_err();
        assert!(matches!(err, Error::NotActive(ref id) if *id == background));
        assert_eq!(
            err.to_response(ResponseStyle::Plain)["error"],
            json!(format!("Presentation {} is not in the active window", background))
        );
    }

    #[test]
    fn test_base_name_handles_both_separators() {
        assert_eq!(base_name("C:\\a\\b.pptx"), "b.pptx");
        assert_eq!(base_name("/tmp/c.pptx"), "c.pptx");
        assert_eq!(base_name("d.pptx"), "d.pptx");
    }
}
