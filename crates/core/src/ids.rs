//! Parsing and validation of 1-based slide and shape references.

use crate::error::{Error, Result};

/// Characters callers tend to wrap numeric IDs in.
const ID_QUOTES: &[char] = &['"', '\'', '`'];

/// Parse a slide or shape ID that may arrive quote-wrapped (`"2"`, `'2'`).
pub fn parse_id(raw: &str) -> Result<i64> {
    let cleaned = raw.trim().trim_matches(ID_QUOTES).trim();
    cleaned
        .parse::<i64>()
        .map_err(|e| Error::InvalidIdFormat(format!("{e} in {raw:?}")))
}

/// What a 1-based index points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Slide,
    Shape,
}

/// Check a 1-based index against a live count.
///
/// Returns the index unchanged for backends that address items 1-based.
pub fn checked_position(kind: IndexKind, raw: &str, index: i64, count: usize) -> Result<usize> {
    if index >= 1 && (index as u64) <= count as u64 {
        return Ok(index as usize);
    }
    let id = raw.to_string();
    Err(match kind {
        IndexKind::Slide => Error::SlideOutOfRange { id, count },
        IndexKind::Shape => Error::ShapeOutOfRange { id, count },
    })
}

/// Check a 1-based index and translate it to a 0-based offset.
pub fn checked_index(kind: IndexKind, raw: &str, index: i64, count: usize) -> Result<usize> {
    checked_position(kind, raw, index, count).map(|position| position - 1)
}
