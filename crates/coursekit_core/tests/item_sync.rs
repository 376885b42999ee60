use coursekit_core::db::open_db_in_memory;
use coursekit_core::{
    CreateItemPayload, DeleteOutcome, EditOutcome, Item, ItemSyncError, ItemSynchronizer,
    ItemValidationError, RecordingSurface, RemoteCollection, RemoteError, RemoteItem, RemoteMethod,
    RemoteResult, SlotRepository, SqliteSlotRepository, UpdateItemPayload, ITEMS_SLOT_KEY,
    LOCAL_ID_PREFIX,
};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};

/// In-memory remote collection that assigns numeric ids and can be told to
/// fail specific calls.
#[derive(Default)]
struct FakeRemote {
    records: RefCell<Vec<RemoteItem>>,
    next_id: Cell<u64>,
    create_calls: Cell<usize>,
    /// 0-based create call that answers with a 500.
    fail_create_at: Option<usize>,
    fail_list: bool,
    fail_update: bool,
    fail_delete: bool,
    created_without_id: bool,
    updates: RefCell<Vec<(String, Value)>>,
    deletes: RefCell<Vec<String>>,
}

impl FakeRemote {
    fn with_records(records: Vec<Value>) -> Self {
        let records: Vec<RemoteItem> = records
            .into_iter()
            .map(|value| serde_json::from_value(value).unwrap())
            .collect();
        Self {
            next_id: Cell::new(records.len() as u64 + 1),
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    fn status(method: RemoteMethod, code: u16, reason: &str) -> RemoteError {
        RemoteError::Status {
            method,
            code,
            reason: reason.to_string(),
        }
    }
}

impl RemoteCollection for FakeRemote {
    fn endpoint(&self) -> String {
        "fake://items".to_string()
    }

    fn list_items(&self) -> RemoteResult<Vec<RemoteItem>> {
        if self.fail_list {
            return Err(Self::status(RemoteMethod::Get, 500, "Internal Server Error"));
        }
        Ok(self.records.borrow().clone())
    }

    fn create_item(&self, payload: &CreateItemPayload) -> RemoteResult<RemoteItem> {
        let call = self.create_calls.get();
        self.create_calls.set(call + 1);
        if self.fail_create_at == Some(call) {
            return Err(Self::status(RemoteMethod::Post, 500, "Internal Server Error"));
        }
        if self.created_without_id {
            return Ok(RemoteItem {
                id: Value::Null,
                name: json!(payload.name),
                price: json!(payload.price),
            });
        }

        let id = self.next_id.get().max(1);
        self.next_id.set(id + 1);
        let record = RemoteItem {
            id: json!(id),
            name: json!(payload.name),
            price: json!(payload.price),
        };
        self.records.borrow_mut().push(record.clone());
        Ok(record)
    }

    fn update_item(&self, id: &str, payload: &UpdateItemPayload) -> RemoteResult<RemoteItem> {
        if self.fail_update {
            return Err(Self::status(RemoteMethod::Put, 404, "Not Found"));
        }
        self.updates
            .borrow_mut()
            .push((id.to_string(), serde_json::to_value(payload).unwrap()));
        Ok(RemoteItem {
            id: payload.id.clone(),
            name: json!(payload.name),
            price: json!(payload.price),
        })
    }

    fn delete_item(&self, id: &str) -> RemoteResult<()> {
        if self.fail_delete {
            return Err(Self::status(RemoteMethod::Delete, 404, "Not Found"));
        }
        self.deletes.borrow_mut().push(id.to_string());
        Ok(())
    }
}

fn status_message<S: SlotRepository>(
    sync: &ItemSynchronizer<S, FakeRemote, RecordingSurface>,
) -> (bool, String) {
    let status = sync.surface().status().expect("status should be set");
    (status.is_err(), status.message.clone())
}

#[test]
fn open_announces_ready_and_renders_persisted_items() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    repo.write_slot(
        ITEMS_SLOT_KEY,
        r#"[{"id":"4","name":"Pen","price":2.5,"synced":true}]"#,
    )
    .unwrap();

    let sync = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());
    assert_eq!(sync.items().len(), 1);
    assert_eq!(sync.surface().rows()[0].text, "Pen - $2.50");
    assert_eq!(
        status_message(&sync),
        (
            false,
            "App ready. Add items locally or sync with API.".to_string()
        )
    );
}

#[test]
fn add_item_creates_unsynced_local_entry() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let mut sync = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());

    let item = sync.add_item("  Notebook ", "3.5").unwrap();
    assert!(item.id.starts_with(LOCAL_ID_PREFIX));
    assert!(!item.synced);
    assert_eq!(item.name, "Notebook");
    assert_eq!(
        status_message(&sync),
        (false, "Item added locally: Notebook".to_string())
    );

    let blank_price = sync.add_item("Eraser", "  ").unwrap();
    assert_eq!(blank_price.price, 0.0);
    assert_eq!(sync.items().len(), 2);
}

#[test]
fn add_item_rejects_invalid_input_without_mutation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let mut sync = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());

    let cases = [
        ("   ", "1", ItemValidationError::NameRequired, "Name is required."),
        ("Pen", "abc", ItemValidationError::PriceNotNumber, "Price must be a valid number."),
        ("Pen", "-1", ItemValidationError::NegativePrice, "Price must be >= 0."),
    ];
    for (name, price, expected, message) in cases {
        let err = sync.add_item(name, price).unwrap_err();
        match err {
            ItemSyncError::Validation(actual) => assert_eq!(actual, expected),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(status_message(&sync), (true, message.to_string()));
    }
    assert!(sync.items().is_empty());
}

#[test]
fn push_stops_at_first_failure_and_keeps_earlier_progress() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote {
        fail_create_at: Some(2),
        ..FakeRemote::default()
    };
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    for name in ["a", "b", "c", "d"] {
        sync.add_item(name, "1").unwrap();
    }
    let local_ids: Vec<String> = sync.items().iter().map(|item| item.id.clone()).collect();

    let report = sync.push();
    assert_eq!(report.pending, 4);
    assert_eq!(report.pushed, 2);
    assert!(!report.is_complete());
    let failure = report.failure.expect("third create fails");
    assert_eq!(failure.index, 2);
    assert_eq!(failure.local_id, local_ids[2]);

    let items = sync.items();
    assert_eq!(items[0].id, "1");
    assert_eq!(items[1].id, "2");
    assert!(items[0].synced && items[1].synced);
    assert_eq!(items[2].id, local_ids[2]);
    assert_eq!(items[3].id, local_ids[3]);
    assert!(!items[2].synced && !items[3].synced);
    assert_eq!(sync.remote().create_calls.get(), 3);
    assert_eq!(
        status_message(&sync),
        (
            true,
            "Sync POST error: POST failed: 500 Internal Server Error".to_string()
        )
    );

    drop(sync);
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let reopened = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());
    let synced: Vec<bool> = reopened.items().iter().map(|item| item.synced).collect();
    assert_eq!(synced, vec![true, true, false, false]);
}

#[test]
fn push_with_nothing_pending_makes_no_calls() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let mut sync = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());

    let report = sync.push();
    assert!(report.is_complete());
    assert_eq!(report.pending, 0);
    assert_eq!(sync.remote().create_calls.get(), 0);
    assert_eq!(
        status_message(&sync),
        (false, "No pending local items to POST.".to_string())
    );
}

#[test]
fn push_all_marks_every_item_synced() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let mut sync = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());
    sync.add_item("a", "1").unwrap();
    sync.add_item("b", "2").unwrap();

    let report = sync.push();
    assert!(report.is_complete());
    assert_eq!(report.pushed, 2);
    assert!(sync.items().iter().all(|item| item.synced && !item.is_local_only()));
    assert_eq!(
        status_message(&sync),
        (false, "Synced to API (POST). Posted 2 items.".to_string())
    );
}

#[test]
fn created_record_without_id_is_a_push_failure() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote {
        created_without_id: true,
        ..FakeRemote::default()
    };
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.add_item("a", "1").unwrap();

    let report = sync.push();
    let failure = report.failure.expect("missing id must fail");
    assert!(matches!(
        failure.error,
        ItemSyncError::Remote(RemoteError::Decode {
            method: RemoteMethod::Post,
            ..
        })
    ));
    assert!(!sync.items()[0].synced);
}

#[test]
fn pull_replaces_local_list_and_drops_unsynced_items() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote::with_records(vec![
        json!({"id": 1, "name": "Pen", "price": 2.5}),
        json!({"id": "x9", "name": null, "price": "oops"}),
    ]);
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.add_item("local only", "4").unwrap();

    assert_eq!(sync.pull().unwrap(), 2);
    assert_eq!(
        sync.items(),
        [
            Item {
                id: "1".to_string(),
                name: "Pen".to_string(),
                price: 2.5,
                synced: true,
            },
            Item {
                id: "x9".to_string(),
                name: String::new(),
                price: 0.0,
                synced: true,
            },
        ]
    );
    assert_eq!(
        status_message(&sync),
        (false, "Synced from API (GET). Loaded 2 items.".to_string())
    );
}

#[test]
fn pull_skips_records_without_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote::with_records(vec![
        json!({"name": "No id", "price": 1.0}),
        json!({"id": "  ", "name": "Blank id", "price": 1.0}),
        json!({"id": 3, "name": "Ink", "price": 0.5}),
    ]);
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());

    assert_eq!(sync.pull().unwrap(), 1);
    let ids: Vec<&str> = sync.items().iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, ["3"]);
    assert_eq!(
        status_message(&sync),
        (false, "Synced from API (GET). Loaded 1 items.".to_string())
    );
}

#[test]
fn failed_pull_keeps_local_list() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote {
        fail_list: true,
        ..FakeRemote::default()
    };
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.add_item("keep me", "1").unwrap();

    assert!(matches!(sync.pull(), Err(ItemSyncError::Remote(_))));
    assert_eq!(sync.items().len(), 1);
    assert_eq!(
        status_message(&sync),
        (
            true,
            "Sync GET error: GET failed: 500 Internal Server Error".to_string()
        )
    );
}

#[test]
fn editing_local_item_never_calls_remote() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let mut sync = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());
    let item = sync.add_item("Pen", "1").unwrap();

    let outcome = sync.edit_item(&item.id, Some("Marker"), Some("2")).unwrap();
    match outcome {
        EditOutcome::EditedLocally(edited) => {
            assert_eq!(edited.name, "Marker");
            assert_eq!(edited.price, 2.0);
            assert!(!edited.synced);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(sync.remote().updates.borrow().is_empty());
    assert_eq!(
        status_message(&sync),
        (false, "Edited locally (not synced yet).".to_string())
    );
}

#[test]
fn editing_synced_item_sends_numeric_id_in_put_body() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote::with_records(vec![json!({"id": 7, "name": "Pen", "price": 1.0})]);
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.pull().unwrap();

    let outcome = sync.edit_item("7", Some(" Pencil "), Some("1.25")).unwrap();
    assert!(matches!(outcome, EditOutcome::UpdatedRemote(_)));
    assert_eq!(
        sync.remote().updates.borrow().as_slice(),
        [(
            "7".to_string(),
            json!({"id": 7, "name": "Pencil", "price": 1.25})
        )]
    );
    assert_eq!(
        status_message(&sync),
        (false, "Updated on API (PUT): Pencil".to_string())
    );
}

#[test]
fn failed_put_keeps_local_edit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote {
        fail_update: true,
        ..FakeRemote::with_records(vec![json!({"id": 3, "name": "Pen", "price": 1.0})])
    };
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.pull().unwrap();

    let err = sync.edit_item("3", Some("Brush"), Some("9")).unwrap_err();
    assert!(matches!(err, ItemSyncError::Remote(_)));
    assert_eq!(sync.items()[0].name, "Brush");
    assert_eq!(
        status_message(&sync),
        (true, "PUT error: PUT failed: 404 Not Found".to_string())
    );
}

#[test]
fn dismissed_prompt_cancels_edit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let mut sync = ItemSynchronizer::open(repo, FakeRemote::default(), RecordingSurface::new());
    let item = sync.add_item("Pen", "1").unwrap();

    assert_eq!(
        sync.edit_item(&item.id, None, Some("3")).unwrap(),
        EditOutcome::Cancelled
    );
    assert_eq!(
        sync.edit_item(&item.id, Some("Ink"), None).unwrap(),
        EditOutcome::Cancelled
    );
    assert_eq!(sync.items()[0], item);
}

#[test]
fn delete_remote_failure_does_not_restore_item() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote {
        fail_delete: true,
        ..FakeRemote::with_records(vec![json!({"id": 5, "name": "Pen", "price": 1.0})])
    };
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.pull().unwrap();

    let err = sync.delete_item("5").unwrap_err();
    assert!(matches!(err, ItemSyncError::Remote(_)));
    assert!(sync.items().is_empty());
    assert!(sync.surface().rows().is_empty());
    assert_eq!(
        status_message(&sync),
        (true, "DELETE error: DELETE failed: 404 Not Found".to_string())
    );
}

#[test]
fn delete_routes_by_id_kind() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote::with_records(vec![json!({"id": 5, "name": "Pen", "price": 1.0})]);
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.pull().unwrap();
    let local = sync.add_item("Draft", "0").unwrap();

    assert!(matches!(
        sync.delete_item(&local.id).unwrap(),
        DeleteOutcome::DeletedLocally(_)
    ));
    assert_eq!(
        status_message(&sync),
        (false, "Deleted locally (not on API).".to_string())
    );

    assert!(matches!(
        sync.delete_item("5").unwrap(),
        DeleteOutcome::DeletedRemote(_)
    ));
    assert_eq!(sync.remote().deletes.borrow().as_slice(), ["5".to_string()]);
    assert_eq!(
        status_message(&sync),
        (false, "Deleted on API (DELETE): id=5".to_string())
    );

    assert!(matches!(
        sync.delete_item("5"),
        Err(ItemSyncError::NotFound(_))
    ));
    assert_eq!(
        status_message(&sync),
        (true, "Item not found locally.".to_string())
    );
}

#[test]
fn clear_local_empties_list_without_remote_calls() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let remote = FakeRemote::with_records(vec![json!({"id": 1, "name": "Pen", "price": 1.0})]);
    let mut sync = ItemSynchronizer::open(repo, remote, RecordingSurface::new());
    sync.pull().unwrap();
    sync.add_item("Draft", "1").unwrap();

    sync.clear_local().unwrap();
    assert!(sync.items().is_empty());
    assert!(sync.remote().deletes.borrow().is_empty());
    assert_eq!(sync.remote().records.borrow().len(), 1);
    assert_eq!(
        status_message(&sync),
        (false, "Local data cleared.".to_string())
    );

    let slots = SqliteSlotRepository::try_new(&conn).unwrap();
    assert_eq!(slots.read_slot(ITEMS_SLOT_KEY).unwrap(), None);
}
