//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence slot contract used by list-based services.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors in addition to DB transport errors.

pub mod slot_repo;
