//! Domain models for the three coursework components.
//!
//! # Responsibility
//! - Define the records held by the catalog, the notes list and the item list.
//! - Own input validation so services never store unchecked values.
//!
//! # Invariants
//! - Every validation failure is a typed error, never a free-text message.

pub mod item;
pub mod note;
pub mod product;
