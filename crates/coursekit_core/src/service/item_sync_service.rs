//! Item synchronizer use-case service.
//!
//! # Responsibility
//! - Keep the item list in memory and mirror it to the `hu4_items` slot.
//! - Push unsynced items to, and pull the full collection from, a remote.
//! - Report every outcome through the surface status line and the log.
//!
//! # Invariants
//! - Every local mutation overwrites the whole persisted list before the
//!   in-memory list changes.
//! - Pull replaces the whole local list, dropping unsynced local items.
//!   Remote records without an id are skipped, so every item id is non-empty.
//! - Push runs strictly in list order and stops at the first failure; items
//!   pushed before it stay synced, the rest stay untouched.
//! - Remote calls are only issued for ids without the local-only prefix.
//! - A remote failure never rolls back a local edit or delete.

use crate::model::item::{parse_price, validate_item_input, Item, ItemValidationError};
use crate::repo::slot_repo::{load_json_list, save_json_list, RepoError, SlotRepository};
use crate::sync::remote::{
    CreateItemPayload, RemoteCollection, RemoteError, RemoteItem, RemoteMethod, UpdateItemPayload,
};
use crate::view::{ListRow, ListSurface, RowAction, StatusLine};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Persistence slot key holding the item list.
pub const ITEMS_SLOT_KEY: &str = "hu4_items";

#[derive(Debug)]
pub enum ItemSyncError {
    Validation(ItemValidationError),
    NotFound(String),
    Persist(RepoError),
    Remote(RemoteError),
}

impl Display for ItemSyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found locally: {id}"),
            Self::Persist(err) => write!(f, "failed to save items: {err}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ItemSyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ItemValidationError> for ItemSyncError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RemoteError> for ItemSyncError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<RepoError> for ItemSyncError {
    fn from(value: RepoError) -> Self {
        Self::Persist(value)
    }
}

pub type ItemSyncResult<T> = Result<T, ItemSyncError>;

/// First failure of a push run.
#[derive(Debug)]
pub struct PushFailure {
    /// 0-based position within the pending snapshot.
    pub index: usize,
    /// Local id of the item whose create failed.
    pub local_id: String,
    pub error: ItemSyncError,
}

/// Outcome of [`ItemSynchronizer::push`].
#[derive(Debug)]
pub struct PushReport {
    /// Number of unsynced items when the push started.
    pub pending: usize,
    /// Number of items created remotely and marked synced.
    pub pushed: usize,
    pub failure: Option<PushFailure>,
}

impl PushReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// One of the prompts was dismissed; nothing changed.
    Cancelled,
    /// Local-only item; no remote call issued.
    EditedLocally(Item),
    /// Local copy updated and the remote replace succeeded.
    UpdatedRemote(Item),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// Local-only item; no remote call issued.
    DeletedLocally(Item),
    /// Removed locally and remotely.
    DeletedRemote(Item),
}

/// Item list bound to a persistence slot, a remote collection and a surface.
pub struct ItemSynchronizer<S: SlotRepository, R: RemoteCollection, V: ListSurface> {
    slot: S,
    remote: R,
    surface: V,
    items: Vec<Item>,
}

impl<S, R, V> ItemSynchronizer<S, R, V>
where
    S: SlotRepository,
    R: RemoteCollection,
    V: ListSurface,
{
    /// Loads persisted items and performs the initial render.
    pub fn open(slot: S, remote: R, surface: V) -> Self {
        let items: Vec<Item> = load_json_list(&slot, ITEMS_SLOT_KEY);
        let mut synchronizer = Self {
            slot,
            remote,
            surface,
            items,
        };
        synchronizer.render();
        info!(
            "event=items_open module=items status=ok count={} endpoint={}",
            synchronizer.items.len(),
            synchronizer.remote.endpoint()
        );
        synchronizer.status_ok("App ready. Add items locally or sync with API.");
        synchronizer
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Validates raw form input and appends a new local-only item.
    pub fn add_item(&mut self, name_raw: &str, price_raw: &str) -> ItemSyncResult<Item> {
        let input = match validate_item_input(name_raw, parse_price(price_raw)) {
            Ok(input) => input,
            Err(err) => return Err(self.fail(err.into())),
        };

        let item = Item::new_local(input.name, input.price);
        let mut next = self.items.clone();
        next.push(item.clone());
        if let Err(err) = self.commit(next) {
            return Err(self.fail(err));
        }

        self.status_ok(format!("Item added locally: {}", item.name));
        Ok(item)
    }

    /// Replaces the local list with the remote collection.
    ///
    /// Returns the number of items loaded. Unsynced local items are dropped.
    pub fn pull(&mut self) -> ItemSyncResult<usize> {
        let fetched = match self.remote.list_items() {
            Ok(records) => records,
            Err(err) => {
                self.status_err(format!("Sync GET error: {err}"));
                return Err(err.into());
            }
        };

        let fetched_count = fetched.len();
        let next: Vec<Item> = fetched
            .into_iter()
            .filter_map(RemoteItem::into_synced_item)
            .collect();
        let count = next.len();
        if count < fetched_count {
            warn!(
                "event=items_pull module=items status=partial skipped_without_id={}",
                fetched_count - count
            );
        }
        if let Err(err) = self.commit(next) {
            self.status_err(format!("Sync GET error: {err}"));
            return Err(err);
        }

        self.status_ok(format!("Synced from API (GET). Loaded {count} items."));
        Ok(count)
    }

    /// Creates every unsynced item remotely, one at a time, in list order.
    pub fn push(&mut self) -> PushReport {
        let pending: Vec<(String, CreateItemPayload)> = self
            .items
            .iter()
            .filter(|item| !item.synced)
            .map(|item| {
                (
                    item.id.clone(),
                    CreateItemPayload {
                        name: item.name.clone(),
                        price: item.price,
                    },
                )
            })
            .collect();

        let mut report = PushReport {
            pending: pending.len(),
            pushed: 0,
            failure: None,
        };

        if pending.is_empty() {
            self.status_ok("No pending local items to POST.");
            return report;
        }

        for (index, (local_id, payload)) in pending.into_iter().enumerate() {
            if let Err(error) = self.push_one(&local_id, &payload) {
                self.status_err(format!("Sync POST error: {error}"));
                report.failure = Some(PushFailure {
                    index,
                    local_id,
                    error,
                });
                return report;
            }
            report.pushed += 1;
        }

        self.status_ok(format!(
            "Synced to API (POST). Posted {} items.",
            report.pushed
        ));
        report
    }

    /// Applies prompt answers to one item.
    ///
    /// `None` for either answer means the prompt was dismissed. The local copy
    /// is updated before any remote call; an `Err(Remote)` result still leaves
    /// the local edit in place.
    pub fn edit_item(
        &mut self,
        id: &str,
        name_input: Option<&str>,
        price_input: Option<&str>,
    ) -> ItemSyncResult<EditOutcome> {
        let Some(position) = self.position_of(id) else {
            return Err(self.fail(ItemSyncError::NotFound(id.to_string())));
        };
        let (Some(name_input), Some(price_input)) = (name_input, price_input) else {
            return Ok(EditOutcome::Cancelled);
        };

        let input = match validate_item_input(name_input, parse_price(price_input)) {
            Ok(input) => input,
            Err(err) => return Err(self.fail(err.into())),
        };

        let mut next = self.items.clone();
        next[position].name = input.name.clone();
        next[position].price = input.price;
        let edited = next[position].clone();
        if let Err(err) = self.commit(next) {
            return Err(self.fail(err));
        }

        if edited.is_local_only() {
            self.status_ok("Edited locally (not synced yet).");
            return Ok(EditOutcome::EditedLocally(edited));
        }

        let payload = UpdateItemPayload::new(&edited.id, input.name.clone(), input.price);
        match self.remote.update_item(&edited.id, &payload) {
            Ok(_) => {
                self.status_ok(format!("Updated on API (PUT): {}", input.name));
                Ok(EditOutcome::UpdatedRemote(edited))
            }
            Err(err) => {
                self.status_err(format!("PUT error: {err}"));
                Err(err.into())
            }
        }
    }

    /// Removes one item locally, then remotely when it has a remote id.
    ///
    /// An `Err(Remote)` result still leaves the item removed locally.
    pub fn delete_item(&mut self, id: &str) -> ItemSyncResult<DeleteOutcome> {
        let Some(position) = self.position_of(id) else {
            self.status_err("Item not found locally.");
            return Err(ItemSyncError::NotFound(id.to_string()));
        };

        let mut next = self.items.clone();
        let removed = next.remove(position);
        if let Err(err) = self.commit(next) {
            return Err(self.fail(err));
        }
        info!("Item deleted locally: {}", removed.id);

        if removed.is_local_only() {
            self.status_ok("Deleted locally (not on API).");
            return Ok(DeleteOutcome::DeletedLocally(removed));
        }

        match self.remote.delete_item(&removed.id) {
            Ok(()) => {
                self.status_ok(format!("Deleted on API (DELETE): id={}", removed.id));
                Ok(DeleteOutcome::DeletedRemote(removed))
            }
            Err(err) => {
                self.status_err(format!("DELETE error: {err}"));
                Err(err.into())
            }
        }
    }

    /// Empties the local list and drops its slot without touching the remote.
    pub fn clear_local(&mut self) -> ItemSyncResult<()> {
        if let Err(err) = self.slot.remove_slot(ITEMS_SLOT_KEY) {
            return Err(self.fail(err.into()));
        }
        let dropped = self.items.len();
        self.items.clear();
        info!("event=items_clear module=items status=ok dropped={dropped}");
        self.render();
        self.status_ok("Local data cleared.");
        Ok(())
    }

    fn push_one(&mut self, local_id: &str, payload: &CreateItemPayload) -> ItemSyncResult<()> {
        let created = self.remote.create_item(payload)?;
        let remote_id = created.id_string().ok_or_else(|| RemoteError::Decode {
            method: RemoteMethod::Post,
            message: "created item has no id".to_string(),
        })?;

        let mut next = self.items.clone();
        if let Some(item) = next.iter_mut().find(|item| item.id == local_id) {
            item.id = remote_id.clone();
            item.synced = true;
        }
        self.commit(next)?;
        info!("event=item_push module=items status=ok local_id={local_id} remote_id={remote_id}");
        Ok(())
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn commit(&mut self, next: Vec<Item>) -> ItemSyncResult<()> {
        save_json_list(&self.slot, ITEMS_SLOT_KEY, &next)?;
        self.items = next;
        info!("Items saved. Count={}", self.items.len());
        self.render();
        Ok(())
    }

    fn render(&mut self) {
        let rows = self
            .items
            .iter()
            .map(|item| ListRow {
                key: item.id.clone(),
                text: item.label(),
                actions: vec![RowAction::Edit, RowAction::Delete],
            })
            .collect();
        self.surface.replace_rows(rows);
        info!("Items rendered. Count={}", self.items.len());
    }

    fn fail(&mut self, err: ItemSyncError) -> ItemSyncError {
        let message = match &err {
            ItemSyncError::NotFound(_) => "Item not found locally.".to_string(),
            other => other.to_string(),
        };
        self.status_err(message);
        err
    }

    fn status_ok(&mut self, message: impl Into<String>) {
        let status = StatusLine::ok(message);
        info!("{}", status.message);
        self.surface.set_status(status);
    }

    fn status_err(&mut self, message: impl Into<String>) {
        let status = StatusLine::err(message);
        error!("{}", status.message);
        self.surface.set_status(status);
    }
}
