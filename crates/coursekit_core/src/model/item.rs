//! Item domain model for the synchronized item list.
//!
//! # Responsibility
//! - Define the locally persisted item record and its sync flag.
//! - Generate and recognize local-only ids.
//! - Parse and validate raw user input for name/price.
//!
//! # Invariants
//! - Local-only ids always start with [`LOCAL_ID_PREFIX`].
//! - A freshly created local item has `synced == false`.
//! - Validated prices are finite and `>= 0`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Prefix carried by ids assigned before any remote round-trip.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Locally held item, persisted as `{id, name, price, synced}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub synced: bool,
}

impl Item {
    /// Creates an unsynced item with a generated local-only id.
    pub fn new_local(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: generate_local_id(),
            name: name.into(),
            price,
            synced: false,
        }
    }

    /// Returns whether this item still carries a local-only id.
    pub fn is_local_only(&self) -> bool {
        is_local_id(&self.id)
    }

    /// Display text used by list rows: `<name> - $<price>`.
    pub fn label(&self) -> String {
        format!("{} - ${:.2}", self.name, self.price)
    }
}

/// Validated name/price pair ready to be applied to an item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemInput {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NameRequired,
    PriceNotNumber,
    NegativePrice,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameRequired => write!(f, "Name is required."),
            Self::PriceNotNumber => write!(f, "Price must be a valid number."),
            Self::NegativePrice => write!(f, "Price must be >= 0."),
        }
    }
}

impl Error for ItemValidationError {}

/// Returns whether `id` follows the local-only id convention.
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Generates `local_<epoch-millis>_<suffix>`.
pub fn generate_local_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{LOCAL_ID_PREFIX}{millis}_{}", &suffix[..8])
}

/// Parses raw price text.
///
/// Blank input means `0`. Returns `None` when the text is not a finite number.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Validates a name and an already parsed price.
pub fn validate_item_input(
    name: &str,
    price: Option<f64>,
) -> Result<ItemInput, ItemValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ItemValidationError::NameRequired);
    }

    let price = price.ok_or(ItemValidationError::PriceNotNumber)?;
    if price < 0.0 {
        return Err(ItemValidationError::NegativePrice);
    }

    Ok(ItemInput {
        name: name.to_string(),
        price,
    })
}
