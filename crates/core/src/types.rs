//! Result types returned by every backend.
//!
//! Field names are the wire names of the tool results, so these types
//! serialize directly into the objects callers see.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Title reported when no strategy finds one.
pub const UNTITLED_SLIDE: &str = "Untitled Slide";

/// Title reported for a slide that was just added.
pub const NEW_SLIDE_TITLE: &str = "New Slide";

/// Display name of a presentation created in this session.
pub const NEW_PRESENTATION_NAME: &str = "New Presentation";

/// Which backend an adapter drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterKind {
    /// A running PowerPoint instance over COM.
    LiveAutomation,
    /// `.pptx` packages edited in memory.
    PptxFile,
    /// No backend usable on this host.
    Unavailable,
}

impl AdapterKind {
    /// Name reported as `adapter_type` in tool results.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::LiveAutomation => "WindowsCOMAdapter",
            Self::PptxFile => "CrossPlatformPPTXAdapter",
            Self::Unavailable => "UnavailableAdapter",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Summary of an open presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationInfo {
    /// Handle to pass to later calls.
    pub id: String,
    /// File name without directory, or a placeholder for unsaved documents.
    pub name: String,
    /// Full path, empty for unsaved documents.
    pub path: String,
    /// Number of slides right now.
    pub slide_count: usize,
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPresentation {
    /// Always true; kept so the result reads `{success, path}`.
    pub success: bool,
    /// Where the presentation was written.
    pub path: String,
}

impl SavedPresentation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            success: true,
            path: path.into(),
        }
    }
}

/// Summary of one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideInfo {
    /// 1-based position as a string.
    pub id: String,
    /// 1-based position.
    pub index: usize,
    pub title: String,
    pub shape_count: usize,
}

impl SlideInfo {
    pub fn new(index: usize, title: impl Into<String>, shape_count: usize) -> Self {
        Self {
            id: index.to_string(),
            index,
            title: title.into(),
            shape_count,
        }
    }
}

/// Text of a single shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeText {
    pub shape_name: String,
    pub text: String,
}

/// All text on a slide, keyed by 1-based shape index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideText {
    pub slide_id: usize,
    pub slide_index: usize,
    pub slide_count: usize,
    pub shape_count: usize,
    pub content: BTreeMap<usize, ShapeText>,
}

/// Outcome of a mutation that reports `{success, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub success: bool,
    pub message: String,
}

impl Confirmation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Result of adding a text box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedShape {
    pub success: bool,
    pub slide_id: String,
    pub shape_id: String,
    pub message: String,
}

impl AddedShape {
    pub fn new(slide: usize, shape: usize) -> Self {
        Self {
            success: true,
            slide_id: slide.to_string(),
            shape_id: shape.to_string(),
            message: "Text box added successfully".to_string(),
        }
    }
}

/// Box geometry in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(100.0, 100.0, 400.0, 200.0)
    }
}

/// Reference to the slide a selection lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRef {
    pub id: String,
    pub index: usize,
}

/// A selected shape in the live application window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedShape {
    /// 1-based index on the slide, or `"unknown"`.
    pub shape_id: String,
    pub shape_name: String,
    pub shape_type: i32,
    pub shape_type_name: String,
    pub is_text_box: bool,
    pub text: String,
    /// Selected characters, for text selections only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
}

/// Current selection in the live application window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub presentation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide: Option<SlideRef>,
    pub selected_shapes: Vec<SelectedShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Office shape type codes (`MsoShapeType`) used by the live backend.
pub mod shape_type {
    pub const GROUP: i32 = 6;
    pub const PLACEHOLDER: i32 = 14;
    pub const TEXT_BOX: i32 = 17;

    /// Readable name of an `MsoShapeType` code.
    pub fn name(code: i32) -> String {
        let name = match code {
            1 => "msoAutoShape",
            2 => "msoCallout",
            3 => "msoChart",
            4 => "msoComment",
            5 => "msoFreeform",
            6 => "msoGroup",
            7 => "msoEmbeddedOLEObject",
            8 => "msoFormControl",
            9 => "msoLine",
            10 => "msoLinkedOLEObject",
            11 => "msoLinkedPicture",
            12 => "msoOLEControlObject",
            13 => "msoPicture",
            14 => "msoPlaceholder",
            15 => "msoScriptAnchor",
            16 => "msoShapeTypeMixed",
            17 => "msoTextBox",
            18 => "msoMedia",
            19 => "msoTable",
            20 => "msoCanvas",
            21 => "msoDiagram",
            22 => "msoInk",
            23 => "msoInkComment",
            other => return format!("Unknown Type ({other})"),
        };
        name.to_string()
    }
}
