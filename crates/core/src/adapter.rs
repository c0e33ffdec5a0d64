//! The operation set every PowerPoint backend implements.

use crate::error::{Error, Result};
use crate::types::{
    AdapterKind, AddedShape, Confirmation, PresentationInfo, Rect, SavedPresentation, Selection,
    SlideInfo, SlideText,
};
use std::path::Path;

/// A PowerPoint backend.
///
/// Slide and shape IDs for mutations arrive as raw strings so each backend
/// can look the presentation up before parsing them; see
/// [`crate::ids::parse_id`].
pub trait PowerPointAdapter {
    /// Which backend this is.
    fn kind(&self) -> AdapterKind;

    /// Whether the backend's underlying library or application is usable
    /// on this host at all.
    fn is_available(&self) -> bool;

    /// Connect to the underlying application or library. Never fails.
    fn initialize(&mut self) -> bool;

    /// Presentations currently known to this adapter.
    fn open_presentations(&mut self) -> Result<Vec<PresentationInfo>>;

    fn open_presentation(&mut self, path: &Path) -> Result<PresentationInfo>;

    fn create_presentation(&mut self) -> Result<PresentationInfo>;

    /// Save to `path`, or to the presentation's current location.
    fn save_presentation(&mut self, id: &str, path: Option<&Path>) -> Result<SavedPresentation>;

    /// Close the presentation, saving first when `save` is set.
    fn close_presentation(&mut self, id: &str, save: bool) -> Result<()>;

    fn slides(&mut self, id: &str) -> Result<Vec<SlideInfo>>;

    /// Append a slide using an Office layout code (`1` = title slide).
    fn add_slide(&mut self, id: &str, layout_type: i32) -> Result<SlideInfo>;

    /// Text of every shape on a slide that carries some.
    fn slide_text(&mut self, id: &str, slide: i64) -> Result<SlideText>;

    fn update_text(&mut self, id: &str, slide: &str, shape: &str, text: &str)
        -> Result<Confirmation>;

    fn add_text_box(&mut self, id: &str, slide: &str, text: &str, rect: Rect)
        -> Result<AddedShape>;

    fn set_slide_title(&mut self, id: &str, slide: &str, title: &str) -> Result<Confirmation>;

    /// Shapes selected in the application window. Only a live application
    /// has a selection.
    fn selected_shapes(&mut self, id: Option<&str>) -> Result<Selection> {
        let _ = id;
        Err(Error::Unsupported(
            "shape selection requires a running PowerPoint instance".to_string(),
        ))
    }
}

/// Degraded backend used when nothing else works on this host.
#[derive(Debug, Default)]
pub struct UnavailableAdapter;

impl UnavailableAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl PowerPointAdapter for UnavailableAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Unavailable
    }

    fn is_available(&self) -> bool {
        false
    }

    fn initialize(&mut self) -> bool {
        false
    }

    fn open_presentations(&mut self) -> Result<Vec<PresentationInfo>> {
        Err(Error::Unavailable)
    }

    fn open_presentation(&mut self, _path: &Path) -> Result<PresentationInfo> {
        Err(Error::Unavailable)
    }

    fn create_presentation(&mut self) -> Result<PresentationInfo> {
        Err(Error::Unavailable)
    }

    fn save_presentation(&mut self, _id: &str, _path: Option<&Path>) -> Result<SavedPresentation> {
        Err(Error::Unavailable)
    }

    fn close_presentation(&mut self, _id: &str, _save: bool) -> Result<()> {
        Err(Error::Unavailable)
    }

    fn slides(&mut self, _id: &str) -> Result<Vec<SlideInfo>> {
        Err(Error::Unavailable)
    }

    fn add_slide(&mut self, _id: &str, _layout_type: i32) -> Result<SlideInfo> {
        Err(Error::Unavailable)
    }

    fn slide_text(&mut self, _id: &str, _slide: i64) -> Result<SlideText> {
        Err(Error::Unavailable)
    }

    fn update_text(
        &mut self,
        _id: &str,
        _slide: &str,
        _shape: &str,
        _text: &str,
    ) -> Result<Confirmation> {
        Err(Error::Unavailable)
    }

    fn add_text_box(
        &mut self,
        _id: &str,
        _slide: &str,
        _text: &str,
        _rect: Rect,
    ) -> Result<AddedShape> {
        Err(Error::Unavailable)
    }

    fn set_slide_title(&mut self, _id: &str, _slide: &str, _title: &str) -> Result<Confirmation> {
        Err(Error::Unavailable)
    }

    fn selected_shapes(&mut self, _id: Option<&str>) -> Result<Selection> {
        Err(Error::Unavailable)
    }
}
