//! Core logic for the coursekit exercises: a product catalog, a persisted
//! notes list and a remotely synchronized item list.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;
pub mod view;

pub use api::{envelope_unit, Envelope};
pub use config::{ApiConfig, AppConfig, ConfigError};
pub use logging::{
    default_log_level, flush_logs, init_logging, logging_status, LogSettings, LoggingError,
};
pub use model::item::{Item, ItemInput, ItemValidationError, LOCAL_ID_PREFIX};
pub use model::note::NoteValidationError;
pub use model::product::{
    Product, ProductChanges, ProductInput, ProductValidationError, ProductView, StockLevel,
};
pub use repo::slot_repo::{RepoError, RepoResult, SlotRepository, SqliteSlotRepository};
pub use service::catalog_service::{CatalogError, CatalogService, ProductFilter};
pub use service::item_sync_service::{
    DeleteOutcome, EditOutcome, ItemSyncError, ItemSynchronizer, PushFailure, PushReport,
    ITEMS_SLOT_KEY,
};
pub use service::notes_service::{NoteError, NotesWidget, NOTES_SLOT_KEY};
pub use sync::http_remote::HttpRemoteCollection;
pub use sync::remote::{
    CreateItemPayload, RemoteCollection, RemoteError, RemoteItem, RemoteMethod, RemoteResult,
    UpdateItemPayload,
};
pub use view::{ListRow, ListSurface, RecordingSurface, RowAction, StatusKind, StatusLine};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
