//! Uniform operation response envelope.
//!
//! # Responsibility
//! - Present any service result as `{ok, data}` or `{ok: false, error}`.
//!
//! # Invariants
//! - Conversion never panics; errors are flattened to their display text.
//! - `data` is omitted when an operation has no payload.

use serde::Serialize;
use std::fmt::Display;

/// Serializable result of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Renders as compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|err| format!("{{\"ok\":false,\"error\":\"encode failed: {err}\"}}"))
    }
}

impl Envelope<()> {
    /// Successful operation without a payload (`{ok: true}`).
    pub fn done() -> Self {
        Self {
            ok: true,
            data: None,
            error: None,
        }
    }
}

impl<T: Serialize, E: Display> From<Result<T, E>> for Envelope<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(data) => Self::success(data),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

/// Converts a unit result into `{ok: true}` / `{ok: false, error}`.
pub fn envelope_unit<E: Display>(result: Result<(), E>) -> Envelope<()> {
    match result {
        Ok(()) => Envelope::done(),
        Err(err) => Envelope::failure(err.to_string()),
    }
}
