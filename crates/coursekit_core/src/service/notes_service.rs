//! Notes widget use-case service.
//!
//! # Responsibility
//! - Keep the ordered note list in memory and mirror it to the `notas` slot.
//! - Re-render the full list after every mutation.
//!
//! # Invariants
//! - Notes are identified by index only.
//! - Every mutation overwrites the whole persisted list.
//! - A failed slot write leaves the in-memory list unchanged.

use crate::model::note::{validate_note_text, NoteValidationError};
use crate::repo::slot_repo::{load_json_list, save_json_list, RepoError, SlotRepository};
use crate::view::{ListRow, ListSurface, RowAction, StatusLine};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Persistence slot key holding the note list.
pub const NOTES_SLOT_KEY: &str = "notas";

#[derive(Debug)]
pub enum NoteError {
    Validation(NoteValidationError),
    IndexOutOfRange { index: usize, len: usize },
    Persist(RepoError),
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "note index {index} is out of range (count={len})")
            }
            Self::Persist(err) => write!(f, "failed to save notes: {err}"),
        }
    }
}

impl Error for NoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<NoteValidationError> for NoteError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Notes list bound to a persistence slot and a display surface.
pub struct NotesWidget<S: SlotRepository, V: ListSurface> {
    slot: S,
    surface: V,
    notes: Vec<String>,
}

impl<S: SlotRepository, V: ListSurface> NotesWidget<S, V> {
    /// Loads persisted notes and performs the initial render.
    pub fn open(slot: S, surface: V) -> Self {
        let notes: Vec<String> = load_json_list(&slot, NOTES_SLOT_KEY);
        let mut widget = Self {
            slot,
            surface,
            notes,
        };
        widget.render();
        info!(
            "event=notes_open module=notes status=ok count={}",
            widget.notes.len()
        );
        widget
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    /// Validates, appends and persists one note. Returns the stored text.
    pub fn add_note(&mut self, input: &str) -> Result<String, NoteError> {
        let text = match validate_note_text(input) {
            Ok(text) => text,
            Err(err) => {
                self.surface.set_status(StatusLine::err(err.to_string()));
                return Err(err.into());
            }
        };

        let mut next = self.notes.clone();
        next.push(text.clone());
        self.commit(next)?;
        self.surface.set_status(StatusLine::ok(""));

        info!("Note added: \"{text}\"");
        Ok(text)
    }

    /// Removes the note at `index`. Returns the removed text.
    pub fn delete_note(&mut self, index: usize) -> Result<String, NoteError> {
        if index >= self.notes.len() {
            return Err(NoteError::IndexOutOfRange {
                index,
                len: self.notes.len(),
            });
        }

        let mut next = self.notes.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        info!("Note deleted: \"{removed}\"");
        Ok(removed)
    }

    fn commit(&mut self, next: Vec<String>) -> Result<(), NoteError> {
        if let Err(err) = save_json_list(&self.slot, NOTES_SLOT_KEY, &next) {
            error!("event=notes_save module=notes status=error error={err}");
            self.surface
                .set_status(StatusLine::err(format!("Could not save notes: {err}")));
            return Err(NoteError::Persist(err));
        }
        self.notes = next;
        info!("Saved notes. Count={}", self.notes.len());
        self.render();
        Ok(())
    }

    fn render(&mut self) {
        let rows = self
            .notes
            .iter()
            .enumerate()
            .map(|(index, text)| ListRow {
                key: index.to_string(),
                text: text.clone(),
                actions: vec![RowAction::Delete],
            })
            .collect();
        self.surface.replace_rows(rows);
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteError, NotesWidget, NOTES_SLOT_KEY};
    use crate::db::open_db_in_memory;
    use crate::repo::slot_repo::{SlotRepository, SqliteSlotRepository};
    use crate::view::RecordingSurface;

    #[test]
    fn empty_input_sets_error_status_without_mutation() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSlotRepository::try_new(&conn).unwrap();
        let mut widget = NotesWidget::open(repo, RecordingSurface::new());

        let err = widget.add_note("   ").unwrap_err();
        assert!(matches!(err, NoteError::Validation(_)));
        assert!(widget.notes().is_empty());
        let status = widget.surface().status().expect("status should be set");
        assert!(status.is_err());
        assert_eq!(status.message, "Please write a note before adding.");
    }

    #[test]
    fn out_of_range_delete_is_rejected() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSlotRepository::try_new(&conn).unwrap();
        let mut widget = NotesWidget::open(repo, RecordingSurface::new());
        widget.add_note("only").unwrap();

        let err = widget.delete_note(1).unwrap_err();
        assert!(matches!(err, NoteError::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(widget.notes(), ["only".to_string()]);
    }

    #[test]
    fn corrupt_slot_opens_as_empty_list() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSlotRepository::try_new(&conn).unwrap();
        repo.write_slot(NOTES_SLOT_KEY, "not-json").unwrap();

        let widget = NotesWidget::open(repo, RecordingSurface::new());
        assert!(widget.notes().is_empty());
        assert_eq!(widget.surface().render_count(), 1);
    }
}
