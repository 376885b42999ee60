//! Catalog manager use-case service.
//!
//! # Responsibility
//! - Own the product registry, the derived category set and the stock table.
//! - Provide create/read/list/update/delete and stock adjustment APIs.
//! - Render plain-text reports over the current state.
//!
//! # Invariants
//! - Product ids uniquely key the registry.
//! - The category set is always recomputable from the registry; it is never
//!   edited independently.
//! - Every registered product has exactly one stock entry, and stock is
//!   never negative.
//! - A rejected operation leaves all state unchanged.

use crate::model::product::{
    normalize_text, Product, ProductChanges, ProductInput, ProductValidationError, ProductView,
    StockLevel,
};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Catalog operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    Validation(ProductValidationError),
    AlreadyExists(String),
    NotFound(String),
    /// Adjustment would drive stock below zero.
    NegativeStock { id: String, current: i64, delta: i64 },
    /// Absolute stock amount is negative.
    InvalidStockAmount(i64),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyExists(id) => write!(f, "Product with id {id} already exists"),
            Self::NotFound(id) => write!(f, "Product {id} not found"),
            Self::NegativeStock { .. } => write!(f, "Negative stock is not allowed"),
            Self::InvalidStockAmount(_) => write!(f, "Invalid stock amount"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProductValidationError> for CatalogError {
    fn from(value: ProductValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Optional filters for [`CatalogService::list_products`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub only_active: bool,
    /// Case-insensitive category match. Blank means no filter.
    pub category: Option<String>,
}

/// Application state for the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    products: BTreeMap<String, Product>,
    categories: BTreeSet<String>,
    stock: BTreeMap<String, i64>,
}

impl CatalogState {
    fn refresh_categories(&mut self) {
        self.categories = self.products.values().map(Product::category_key).collect();
    }

    fn init_stock_if_missing(&mut self) {
        for id in self.products.keys() {
            self.stock.entry(id.clone()).or_insert(0);
        }
    }

    fn stock_of(&self, id: &str) -> i64 {
        self.stock.get(id).copied().unwrap_or(0)
    }
}

/// Catalog manager facade over an owned [`CatalogState`].
#[derive(Debug, Clone, Default)]
pub struct CatalogService {
    state: CatalogState,
}

impl CatalogService {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the two starter products used by the demo.
    pub fn with_demo_seed() -> Self {
        let mut state = CatalogState::default();
        for input in [
            ProductInput::new("p001", "Coffee", 12000.0, "beverages"),
            ProductInput::new("p002", "Bread", 4000.0, "food"),
        ] {
            if let Ok(product) = input.validate() {
                state.products.insert(product.id.clone(), product);
            }
        }
        state.refresh_categories();
        state.init_stock_if_missing();
        Self { state }
    }

    /// Validates and registers a product with its initial stock.
    ///
    /// A negative `initial_stock` is stored as `0`.
    pub fn create_product(
        &mut self,
        input: &ProductInput,
        initial_stock: i64,
    ) -> CatalogResult<Product> {
        let product = input.validate()?;
        if self.state.products.contains_key(&product.id) {
            return Err(CatalogError::AlreadyExists(product.id));
        }

        let stock = initial_stock.max(0);
        self.state.categories.insert(product.category_key());
        self.state.stock.insert(product.id.clone(), stock);
        self.state
            .products
            .insert(product.id.clone(), product.clone());

        info!(
            "event=product_create module=catalog status=ok id={} stock={}",
            product.id, stock
        );
        Ok(product)
    }

    /// Gets one product joined with its stock.
    pub fn get_product(&self, id: &str) -> CatalogResult<ProductView> {
        let key = id.trim();
        let product = self
            .state
            .products
            .get(key)
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))?;
        Ok(ProductView::new(product, self.state.stock_of(key)))
    }

    /// Lists products in id order, optionally filtered.
    pub fn list_products(&self, filter: &ProductFilter) -> Vec<ProductView> {
        let category = filter
            .category
            .as_deref()
            .map(normalize_text)
            .filter(|value| !value.is_empty());

        self.state
            .products
            .values()
            .filter(|product| !filter.only_active || product.active)
            .filter(|product| match category.as_deref() {
                Some(wanted) => product.category_key() == wanted,
                None => true,
            })
            .map(|product| ProductView::new(product, self.state.stock_of(&product.id)))
            .collect()
    }

    /// Merges `changes` over the stored product and re-validates.
    pub fn update_product(&mut self, id: &str, changes: &ProductChanges) -> CatalogResult<Product> {
        let key = id.trim();
        let current = self
            .state
            .products
            .get(key)
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))?;

        let updated = current.merged_with(changes).validate()?;
        let category_changed = current.category_key() != updated.category_key();

        self.state
            .products
            .insert(updated.id.clone(), updated.clone());
        if category_changed {
            self.state.refresh_categories();
        }

        info!(
            "event=product_update module=catalog status=ok id={} category_changed={}",
            updated.id, category_changed
        );
        Ok(updated)
    }

    /// Removes a product and its stock entry.
    pub fn delete_product(&mut self, id: &str) -> CatalogResult<()> {
        let key = id.trim();
        if self.state.products.remove(key).is_none() {
            return Err(CatalogError::NotFound(key.to_string()));
        }
        self.state.stock.remove(key);
        self.state.refresh_categories();

        info!("event=product_delete module=catalog status=ok id={key}");
        Ok(())
    }

    /// Applies a relative stock change. The result must stay `>= 0`.
    pub fn adjust_stock(&mut self, id: &str, delta: i64) -> CatalogResult<StockLevel> {
        let key = self.require_product(id)?;
        let current = self.state.stock_of(&key);
        let next = current
            .checked_add(delta)
            .filter(|value| *value >= 0)
            .ok_or_else(|| CatalogError::NegativeStock {
                id: key.clone(),
                current,
                delta,
            })?;

        self.state.stock.insert(key.clone(), next);
        info!(
            "event=stock_adjust module=catalog status=ok id={} delta={} stock={}",
            key, delta, next
        );
        Ok(StockLevel {
            id: key,
            stock: next,
        })
    }

    /// Sets an absolute stock amount. The amount must be `>= 0`.
    pub fn set_stock(&mut self, id: &str, amount: i64) -> CatalogResult<StockLevel> {
        let key = self.require_product(id)?;
        if amount < 0 {
            return Err(CatalogError::InvalidStockAmount(amount));
        }

        self.state.stock.insert(key.clone(), amount);
        info!(
            "event=stock_set module=catalog status=ok id={} stock={}",
            key, amount
        );
        Ok(StockLevel {
            id: key,
            stock: amount,
        })
    }

    /// Registered product ids in order.
    pub fn ids(&self) -> Vec<String> {
        self.state.products.keys().cloned().collect()
    }

    /// Derived, normalized category set.
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.state.categories
    }

    /// Stock table entries in id order.
    pub fn stock_levels(&self) -> Vec<StockLevel> {
        self.state
            .stock
            .iter()
            .map(|(id, stock)| StockLevel {
                id: id.clone(),
                stock: *stock,
            })
            .collect()
    }

    /// Renders the ids/products/categories/stock report as text lines.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("IDs: {}", self.ids().join(", "))];

        lines.push("Products:".to_string());
        for product in self.state.products.values() {
            lines.push(format!(
                "- {}: {} (${}) [{}] active={} stock={}",
                product.id,
                product.name,
                product.price,
                product.category,
                product.active,
                self.state.stock_of(&product.id)
            ));
        }

        lines.push("Categories:".to_string());
        lines.extend(self.state.categories.iter().map(|cat| format!("- {cat}")));

        lines.push("Stock:".to_string());
        lines.extend(
            self.state
                .stock
                .iter()
                .map(|(id, qty)| format!("- {id}: {qty}")),
        );
        lines
    }

    fn require_product(&self, id: &str) -> CatalogResult<String> {
        let key = id.trim();
        if !self.state.products.contains_key(key) {
            return Err(CatalogError::NotFound(key.to_string()));
        }
        Ok(key.to_string())
    }
}
