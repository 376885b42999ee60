//! Display surface abstraction for list-based services.
//!
//! # Responsibility
//! - Describe the rendered list as plain rows with action controls.
//! - Carry a single user-facing status line.
//!
//! # Invariants
//! - `replace_rows` always receives the complete list; surfaces never diff.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Action control offered by one rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Edit,
    Delete,
}

/// One rendered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    /// Handle passed back to the owning service when an action fires
    /// (list index for notes, item id for items).
    pub key: String,
    pub text: String,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Ok,
    Err,
}

/// User-facing status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusLine {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Ok,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Err,
            message: message.into(),
        }
    }

    pub fn is_err(&self) -> bool {
        self.kind == StatusKind::Err
    }
}

impl Display for StatusLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            StatusKind::Ok => write!(f, "[ok] {}", self.message),
            StatusKind::Err => write!(f, "[err] {}", self.message),
        }
    }
}

/// Target that list services render into.
pub trait ListSurface {
    /// Discards all current rows and shows `rows` instead.
    fn replace_rows(&mut self, rows: Vec<ListRow>);
    /// Replaces the status line.
    fn set_status(&mut self, status: StatusLine);
}

/// In-memory surface that keeps the latest render.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    rows: Vec<ListRow>,
    status: Option<StatusLine>,
    render_count: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// Number of full re-renders performed so far.
    pub fn render_count(&self) -> usize {
        self.render_count
    }
}

impl ListSurface for RecordingSurface {
    fn replace_rows(&mut self, rows: Vec<ListRow>) {
        self.rows = rows;
        self.render_count += 1;
    }

    fn set_status(&mut self, status: StatusLine) {
        self.status = Some(status);
    }
}

impl<T: ListSurface + ?Sized> ListSurface for &mut T {
    fn replace_rows(&mut self, rows: Vec<ListRow>) {
        (**self).replace_rows(rows);
    }

    fn set_status(&mut self, status: StatusLine) {
        (**self).set_status(status);
    }
}
