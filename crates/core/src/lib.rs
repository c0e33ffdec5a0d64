//! Adapter contract, result types, and error taxonomy shared by the
//! PowerPoint automation backends.

pub mod adapter;
pub mod error;
pub mod handles;
pub mod ids;
pub mod title;
pub mod types;

pub use adapter::{PowerPointAdapter, UnavailableAdapter};
pub use error::{Error, ResponseStyle, Result, UNAVAILABLE_MESSAGE};
pub use handles::HandleTable;
pub use ids::{checked_index, checked_position, parse_id, IndexKind};
pub use title::{resolve_title, TitleCandidate};
pub use types::{
    shape_type, AdapterKind, AddedShape, Confirmation, PresentationInfo, Rect, SavedPresentation,
    SelectedShape, Selection, ShapeText, SlideInfo, SlideRef, SlideText, NEW_PRESENTATION_NAME,
    NEW_SLIDE_TITLE, UNTITLED_SLIDE,
};
