//! Product domain model for the catalog manager.
//!
//! # Responsibility
//! - Define the canonical product record and its caller-facing input shapes.
//! - Validate and normalize raw input into a storable `Product`.
//!
//! # Invariants
//! - `id` matches `p` followed by exactly three digits.
//! - `name` and `category` are trimmed and at least 2 characters long.
//! - `price` is finite and strictly positive.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static PRODUCT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^p\d{3}$").expect("valid product id regex"));

const MIN_TEXT_CHARS: usize = 2;

/// Catalog record keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub active: bool,
}

/// Raw creation input. Fields are validated by [`ProductInput::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    /// Defaults to `true` when absent.
    #[serde(default)]
    pub active: Option<bool>,
}

/// Partial update merged over a stored product. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Product read model joined with its stock quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub active: bool,
    pub stock: i64,
}

impl ProductView {
    pub fn new(product: &Product, stock: i64) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            active: product.active,
            stock,
        }
    }
}

/// Result payload of stock operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub id: String,
    pub stock: i64,
}

/// Shape/range violations found while validating product input.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductValidationError {
    InvalidId(String),
    NameTooShort,
    CategoryTooShort,
    InvalidPrice(f64),
}

impl Display for ProductValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(_) => write!(f, "Id must follow p001 format"),
            Self::NameTooShort => write!(f, "Name must have at least 2 characters"),
            Self::CategoryTooShort => write!(f, "Category must have at least 2 characters"),
            Self::InvalidPrice(_) => write!(f, "Price must be a number > 0"),
        }
    }
}

impl Error for ProductValidationError {}

impl ProductInput {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category: category.into(),
            active: None,
        }
    }

    /// Validates and normalizes this input into a storable product.
    ///
    /// Checks run in order id, name, category, price; the first failure wins.
    pub fn validate(&self) -> Result<Product, ProductValidationError> {
        let id = self.id.trim();
        let name = self.name.trim();
        let category = self.category.trim();

        if !is_valid_product_id(id) {
            return Err(ProductValidationError::InvalidId(id.to_string()));
        }
        if name.chars().count() < MIN_TEXT_CHARS {
            return Err(ProductValidationError::NameTooShort);
        }
        if category.chars().count() < MIN_TEXT_CHARS {
            return Err(ProductValidationError::CategoryTooShort);
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ProductValidationError::InvalidPrice(self.price));
        }

        Ok(Product {
            id: id.to_string(),
            name: name.to_string(),
            price: self.price,
            category: category.to_string(),
            active: self.active.unwrap_or(true),
        })
    }
}

impl Product {
    /// Builds the merge candidate for an update, preserving `self.id`.
    pub fn merged_with(&self, changes: &ProductChanges) -> ProductInput {
        ProductInput {
            id: self.id.clone(),
            name: changes.name.clone().unwrap_or_else(|| self.name.clone()),
            price: changes.price.unwrap_or(self.price),
            category: changes
                .category
                .clone()
                .unwrap_or_else(|| self.category.clone()),
            active: Some(changes.active.unwrap_or(self.active)),
        }
    }

    /// Category key used by the derived category set and list filters.
    pub fn category_key(&self) -> String {
        normalize_text(&self.category)
    }
}

/// Returns whether `id` follows the `p001` format.
pub fn is_valid_product_id(id: &str) -> bool {
    PRODUCT_ID_RE.is_match(id)
}

/// Trims and lowercases text for case-insensitive comparisons.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}
