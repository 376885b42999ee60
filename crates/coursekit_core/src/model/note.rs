//! Note text validation.
//!
//! Notes are plain strings identified only by their position in the list.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    Empty,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Please write a note before adding."),
        }
    }
}

impl Error for NoteValidationError {}

/// Trims raw input and rejects blank notes.
pub fn validate_note_text(raw: &str) -> Result<String, NoteValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::Empty);
    }
    Ok(trimmed.to_string())
}
