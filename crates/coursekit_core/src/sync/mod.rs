//! Remote collection access for the item synchronizer.
//!
//! # Responsibility
//! - Define the remote collection SPI and its payload/error types.
//! - Provide the blocking HTTP adapter.
//!
//! # Invariants
//! - Sync layer never touches local persistence directly.

pub mod http_remote;
pub mod remote;
