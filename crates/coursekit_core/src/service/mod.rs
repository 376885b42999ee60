//! Core use-case services.
//!
//! # Responsibility
//! - Own component state explicitly, one service instance per component.
//! - Orchestrate validation, persistence, remote calls and rendering.

pub mod catalog_service;
pub mod item_sync_service;
pub mod notes_service;
