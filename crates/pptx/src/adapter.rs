//! `PowerPointAdapter` over in-memory `.pptx` documents.

use crate::document::Document;
use crate::shapes::{self, RunFormat, ShapeRef};
use ppt_mcp_core::{
    checked_index, parse_id, AdapterKind, AddedShape, Confirmation, Error, HandleTable, IndexKind,
    PowerPointAdapter, PresentationInfo, Rect, Result, SavedPresentation, ShapeText, SlideInfo,
    SlideText, TitleCandidate, NEW_PRESENTATION_NAME, NEW_SLIDE_TITLE,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Office layout code to position in the built-in layout list.
fn layout_index(layout_type: i32) -> usize {
    match layout_type {
        1 => 0,
        2 => 1,
        3 => 3,
        7 => 6,
        _ => 1,
    }
}

/// Frame of the text box used as a title on slides without a title
/// placeholder: 0.5in from the top-left corner, 8in x 1in.
fn fallback_title_frame() -> (i64, i64, i64, i64) {
    (
        shapes::inches_to_emu(0.5),
        shapes::inches_to_emu(0.5),
        shapes::inches_to_emu(8.0),
        shapes::inches_to_emu(1.0),
    )
}

const TITLE_FORMAT: RunFormat = RunFormat {
    size: Some(44.0),
    bold: true,
};

struct PresentationRecord {
    document: Document,
    name: String,
    path: Option<PathBuf>,
    modified: bool,
}

impl PresentationRecord {
    fn info(&self, id: &str) -> PresentationInfo {
        PresentationInfo {
            id: id.to_string(),
            name: self.name.clone(),
            path: self
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            slide_count: self.document.slide_count(),
        }
    }

    /// Resolve a raw 1-based slide ID to a 0-based index.
    fn slide_index(&self, raw: &str) -> Result<usize> {
        let index = parse_id(raw)?;
        checked_index(IndexKind::Slide, raw, index, self.document.slide_count())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File-format backend: edits `.pptx` packages without a running
/// PowerPoint.
#[derive(Default)]
pub struct PptxAdapter {
    presentations: HandleTable<PresentationRecord>,
}

impl PptxAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PowerPointAdapter for PptxAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::PptxFile
    }

    fn is_available(&self) -> bool {
        true
    }

    fn initialize(&mut self) -> bool {
        log::debug!("PPTX backend ready");
        true
    }

    fn open_presentations(&mut self) -> Result<Vec<PresentationInfo>> {
        Ok(self
            .presentations
            .iter()
            .map(|(id, record)| record.info(id))
            .collect())
    }

    fn open_presentation(&mut self, path: &Path) -> Result<PresentationInfo> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let document = Document::open(path).map_err(|e| Error::operation("opening presentation", e))?;
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        let record = PresentationRecord {
            document,
            name: file_name(&path),
            path: Some(path),
            modified: false,
        };
        let id = self.presentations.insert(record);
        log::info!("Opened presentation {}", id);
        Ok(self.presentations.get(&id)?.info(&id))
    }

    fn create_presentation(&mut self) -> Result<PresentationInfo> {
        let document =
            Document::new().map_err(|e| Error::operation("creating presentation", e))?;
        let id = self.presentations.insert(PresentationRecord {
            document,
            name: NEW_PRESENTATION_NAME.to_string(),
            path: None,
            modified: true,
        });
        log::info!("Created presentation {}", id);
        Ok(self.presentations.get(&id)?.info(&id))
    }

    fn save_presentation(&mut self, id: &str, path: Option<&Path>) -> Result<SavedPresentation> {
        let record = self.presentations.get_mut(id)?;
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| record.path.clone())
            .ok_or(Error::NoSavePath)?;

        record
            .document
            .save(&target)
            .map_err(|e| Error::operation("saving presentation", e))?;

        record.name = file_name(&target);
        record.path = Some(target.clone());
        record.modified = false;
        log::info!("Saved presentation {} to {}", id, target.display());
        Ok(SavedPresentation::new(target.display().to_string()))
    }

    fn close_presentation(&mut self, id: &str, save: bool) -> Result<()> {
        let modified = self.presentations.get(id)?.modified;
        if save && modified {
            self.save_presentation(id, None)
                .map_err(|e| Error::SaveBeforeClose(Box::new(e)))?;
        }
        self.presentations.remove(id)?;
        log::info!("Closed presentation {}", id);
        Ok(())
    }

    fn slides(&mut self, id: &str) -> Result<Vec<SlideInfo>> {
        let record = self.presentations.get(id)?;
        Ok(record
            .document
            .slides()
            .iter()
            .enumerate()
            .map(|(i, slide)| SlideInfo::new(i + 1, slide.title(), slide.shape_count()))
            .collect())
    }

    fn add_slide(&mut self, id: &str, layout_type: i32) -> Result<SlideInfo> {
        let record = self.presentations.get_mut(id)?;
        let index = record
            .document
            .add_slide(layout_index(layout_type))
            .map_err(|e| Error::operation("adding slide", e))?;
        record.modified = true;

        let shape_count = record.document.slides()[index].shape_count();
        Ok(SlideInfo::new(index + 1, NEW_SLIDE_TITLE, shape_count))
    }

    fn slide_text(&mut self, id: &str, slide: i64) -> Result<SlideText> {
        let record = self.presentations.get(id)?;
        let slide_count = record.document.slide_count();
        if slide_count == 0 {
            return Err(Error::NoSlides);
        }
        let raw = slide.to_string();
        let index = checked_index(IndexKind::Slide, &raw, slide, slide_count)?;

        let xml = &record.document.slides()[index].xml;
        let all = shapes::shapes(xml);
        let content: BTreeMap<usize, ShapeText> = all
            .iter()
            .enumerate()
            .filter_map(|(i, shape)| {
                let text = shape.text().filter(|t| !t.trim().is_empty())?;
                let shape_name = shape
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Shape {}", i + 1));
                Some((i + 1, ShapeText { shape_name, text }))
            })
            .collect();

        Ok(SlideText {
            slide_id: index + 1,
            slide_index: index + 1,
            slide_count,
            shape_count: all.len(),
            content,
        })
    }

    fn update_text(
        &mut self,
        id: &str,
        slide: &str,
        shape: &str,
        text: &str,
    ) -> Result<Confirmation> {
        let record = self.presentations.get_mut(id)?;
        let slide_index = record.slide_index(slide)?;
        let shape_id = parse_id(shape)?;

        let slide_count = record.document.slide_count();
        let target = record
            .document
            .slide_mut(slide_index)
            .ok_or_else(|| Error::SlideOutOfRange {
                id: slide.to_string(),
                count: slide_count,
            })?;
        let count = target.shape_count();
        let shape_index = checked_index(IndexKind::Shape, shape, shape_id, count)?;
        let Some(element) = shapes::shape_mut(&mut target.xml, shape_index) else {
            return Err(Error::ShapeOutOfRange {
                id: shape.to_string(),
                count,
            });
        };

        if !ShapeRef(element).has_text_frame() {
            return Err(Error::NotEditable(
                "Shape does not contain editable text".to_string(),
            ));
        }
        shapes::set_text(element, text);
        record.modified = true;
        Ok(Confirmation::new("Text updated successfully"))
    }

    fn add_text_box(
        &mut self,
        id: &str,
        slide: &str,
        text: &str,
        rect: Rect,
    ) -> Result<AddedShape> {
        let record = self.presentations.get_mut(id)?;
        let slide_index = record.slide_index(slide)?;
        let target = record
            .document
            .slide_mut(slide_index)
            .ok_or_else(|| Error::Package(format!("slide {} vanished", slide_index + 1)))?;

        let shape_id = shapes::next_shape_id(&target.xml);
        let text_box = shapes::text_box(
            shape_id,
            shapes::frame_from_points(rect),
            text,
            RunFormat::default(),
        );
        let position = shapes::push_shape(&mut target.xml, text_box).ok_or_else(|| {
            Error::operation(
                "adding text box",
                Error::Package("slide has no shape tree".to_string()),
            )
        })?;
        record.modified = true;

        Ok(AddedShape::new(slide_index + 1, position))
    }

    fn set_slide_title(&mut self, id: &str, slide: &str, title: &str) -> Result<Confirmation> {
        let record = self.presentations.get_mut(id)?;
        let slide_index = record.slide_index(slide)?;
        let target = record
            .document
            .slide_mut(slide_index)
            .ok_or_else(|| Error::Package(format!("slide {} vanished", slide_index + 1)))?;

        match shapes::title_shape_mut(&mut target.xml) {
            Some(placeholder) => shapes::set_text(placeholder, title),
            None => {
                let shape_id = shapes::next_shape_id(&target.xml);
                let text_box =
                    shapes::text_box(shape_id, fallback_title_frame(), title, TITLE_FORMAT);
                shapes::push_shape(&mut target.xml, text_box).ok_or_else(|| {
                    Error::operation(
                        "setting slide title",
                        Error::Package("slide has no shape tree".to_string()),
                    )
                })?;
            }
        }
        record.modified = true;
        Ok(Confirmation::new("Slide title has been set"))
    }
}
