//! PPTX (Office Open XML) file backend.
//!
//! Presentations are ZIP packages of XML parts. This crate loads a package
//! into memory, edits the slide parts through a small element tree, and
//! writes the package back, so no PowerPoint installation is needed.

pub mod adapter;
pub mod document;
pub mod package;
pub mod shapes;
pub mod template;
pub mod xml;

pub use adapter::PptxAdapter;
pub use document::{Document, Slide};
pub use package::{ContentTypes, Package, Relationship, Relationships};
pub use shapes::{points_to_emu, EMU_PER_INCH, EMU_PER_POINT};
