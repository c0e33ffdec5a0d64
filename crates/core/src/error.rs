//! Error types shared by every PowerPoint backend.

use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Message reported by every operation of the degraded backend.
pub const UNAVAILABLE_MESSAGE: &str = "No PowerPoint adapter available. \
    Use Windows with PowerPoint installed or enable the PPTX file backend.";

/// Errors that can occur while driving a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// The presentation handle is not in this adapter's handle table.
    #[error("Presentation ID not found: {0}")]
    PresentationNotFound(String),

    /// The file to open does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The presentation has no slides to address.
    #[error("Presentation has no slides")]
    NoSlides,

    /// Slide index outside `[1, count]`.
    #[error("Invalid slide ID: {id}. Valid range is 1-{count}")]
    SlideOutOfRange { id: String, count: usize },

    /// Shape index outside `[1, count]`.
    #[error("Invalid shape ID: {id}. Valid range is 1-{count}")]
    ShapeOutOfRange { id: String, count: usize },

    /// Requested slide layout does not exist in the document.
    #[error("Slide layout {index} not available ({count} layouts)")]
    LayoutOutOfRange { index: usize, count: usize },

    /// A slide or shape ID could not be parsed as an integer.
    #[error("Invalid ID format: {0}")]
    InvalidIdFormat(String),

    /// The presentation is open but not shown in the active window.
    #[error("Presentation {0} is not in the active window")]
    NotActive(String),

    /// Neither backend can be used on this host.
    #[error("{}", UNAVAILABLE_MESSAGE)]
    Unavailable,

    /// The active backend cannot perform this operation.
    #[error("Operation not supported by this adapter: {0}")]
    Unsupported(String),

    /// A save was requested without a target path on a never-saved document.
    #[error("No path specified and no original path available")]
    NoSavePath,

    /// Saving before close failed, the presentation stays open.
    #[error("Failed to save before closing: {0}")]
    SaveBeforeClose(Box<Error>),

    /// The shape has no text frame that can be written.
    #[error("{0}")]
    NotEditable(String),

    /// Failure reported by the live automation object model.
    #[error("Automation error: {0}")]
    Automation(String),

    /// Failed to read or write a file.
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// The package is missing parts or relationships it needs.
    #[error("Invalid presentation package: {0}")]
    Package(String),

    /// A library failure annotated with the action that was running.
    #[error("Error {action}: {source}")]
    Operation {
        action: &'static str,
        #[source]
        source: Box<Error>,
    },
}

/// How an error is rendered into a tool result object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStyle {
    /// Always `{"error": ...}`.
    Plain,
    /// Operations that report `success`: library failures become
    /// `{"success": false, "error": ...}`.
    Outcome,
}

impl Error {
    /// Wrap a library failure with the action that was running.
    pub fn operation(action: &'static str, source: Error) -> Self {
        match source {
            // Only library failures get the action prefix.
            Error::Automation(_)
            | Error::Io(_)
            | Error::Zip(_)
            | Error::Xml(_)
            | Error::Package(_)
            | Error::LayoutOutOfRange { .. } => Error::Operation {
                action,
                source: Box::new(source),
            },
            other => other,
        }
    }

    /// Whether this error comes from input validation rather than the
    /// underlying library.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::PresentationNotFound(_)
                | Error::FileNotFound(_)
                | Error::NoSlides
                | Error::SlideOutOfRange { .. }
                | Error::ShapeOutOfRange { .. }
                | Error::InvalidIdFormat(_)
                | Error::NotActive(_)
                | Error::Unavailable
        )
    }

    /// Render the error as a tool result object.
    pub fn to_response(&self, style: ResponseStyle) -> Value {
        let message = self.to_string();
        match (style, self) {
            (ResponseStyle::Outcome, Error::NotEditable(_)) => {
                json!({ "success": false, "message": message })
            }
            (ResponseStyle::Outcome, err) if !err.is_validation() => {
                json!({ "success": false, "error": message })
            }
            _ => json!({ "error": message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_style_always_uses_error_key() {
        let value = Error::Automation("boom".into()).to_response(ResponseStyle::Plain);
        assert_eq!(value, json!({ "error": "Automation error: boom" }));
    }

    #[test]
    fn test_outcome_style_marks_library_failures() {
        let value = Error::NoSavePath.to_response(ResponseStyle::Outcome);
        assert_eq!(value["success"], json!(false));
        assert_eq!(
            value["error"],
            json!("No path specified and no original path available")
        );
    }

    #[test]
    fn test_outcome_style_keeps_validation_errors_plain() {
        let value =
            Error::PresentationNotFound("abc".into()).to_response(ResponseStyle::Outcome);
        assert_eq!(value, json!({ "error": "Presentation ID not found: abc" }));
    }

    #[test]
    fn test_not_editable_uses_message_key() {
        let value = Error::NotEditable("Shape does not contain editable text".into())
            .to_response(ResponseStyle::Outcome);
        assert_eq!(
            value,
            json!({ "success": false, "message": "Shape does not contain editable text" })
        );
    }

    #[test]
    fn test_operation_context_skips_validation_errors() {
        let err = Error::operation("adding slide", Error::NoSlides);
        assert!(matches!(err, Error::NoSlides));

        let err = Error::operation("updating text", Error::NotEditable("no text".into()));
        assert!(matches!(err, Error::NotEditable(_)));

        let err = Error::operation("adding slide", Error::Xml("bad".into()));
        assert_eq!(err.to_string(), "Error adding slide: XML parsing error: bad");
    }

    #[test]
    fn test_unavailable_message_prefix() {
        assert!(Error::Unavailable
            .to_string()
            .starts_with("No PowerPoint adapter available."));
    }
}
