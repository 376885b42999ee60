//! Remote item collection contract.
//!
//! # Responsibility
//! - Define the list/create/update/delete calls the item synchronizer issues.
//! - Define wire payloads and normalize loosely typed remote records.
//!
//! # Invariants
//! - Any non-2xx response is a failure carrying status code and reason.
//! - Implementations never retry.

use crate::model::item::Item;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// HTTP-style method label used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RemoteMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl Display for RemoteMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote call failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Server answered with a non-2xx status.
    Status {
        method: RemoteMethod,
        code: u16,
        reason: String,
    },
    /// Request never produced a response.
    Transport { method: RemoteMethod, message: String },
    /// Response body did not have the expected shape.
    Decode { method: RemoteMethod, message: String },
    /// Request could not be built, e.g. a blank item id.
    InvalidRequest { method: RemoteMethod, message: String },
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status {
                method,
                code,
                reason,
            } => write!(f, "{method} failed: {code} {reason}"),
            Self::Transport { method, message } => write!(f, "{method} failed: {message}"),
            Self::Decode { method, message } => {
                write!(f, "{method} returned an invalid body: {message}")
            }
            Self::InvalidRequest { method, message } => {
                write!(f, "{method} not sent: {message}")
            }
        }
    }
}

impl Error for RemoteError {}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Body of a remote create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateItemPayload {
    pub name: String,
    pub price: f64,
}

/// Body of a remote replace. `id` is numeric when the id parses as an integer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateItemPayload {
    pub id: Value,
    pub name: String,
    pub price: f64,
}

impl UpdateItemPayload {
    pub fn new(id: &str, name: impl Into<String>, price: f64) -> Self {
        let id = match id.trim().parse::<i64>() {
            Ok(number) => Value::from(number),
            Err(_) => Value::from(id),
        };
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}

/// Loosely typed record as returned by the remote collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteItem {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub price: Value,
}

impl RemoteItem {
    /// Remote id as a string, or `None` when the record carries no usable id
    /// (missing, `null`, blank string, or a nested value).
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Normalizes this record into a synced local item, or `None` without an id.
    ///
    /// Missing names become `""`; missing or non-numeric prices become `0`.
    pub fn into_synced_item(self) -> Option<Item> {
        let id = self.id_string()?;
        let name = match self.name {
            Value::Null => String::new(),
            Value::String(value) => value,
            other => other.to_string(),
        };
        let price = match &self.price {
            Value::Number(number) => number.as_f64().unwrap_or(0.0),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .unwrap_or(0.0),
            Value::Bool(flag) => f64::from(u8::from(*flag)),
            _ => 0.0,
        };
        Some(Item {
            id,
            name,
            price,
            synced: true,
        })
    }
}

/// Remote collection endpoint used by the item synchronizer.
pub trait RemoteCollection {
    /// Display form of the collection endpoint.
    fn endpoint(&self) -> String;
    fn list_items(&self) -> RemoteResult<Vec<RemoteItem>>;
    fn create_item(&self, payload: &CreateItemPayload) -> RemoteResult<RemoteItem>;
    fn update_item(&self, id: &str, payload: &UpdateItemPayload) -> RemoteResult<RemoteItem>;
    fn delete_item(&self, id: &str) -> RemoteResult<()>;
}
