//! Persistence slot contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide a durable, string-keyed key-value slot for whole-list snapshots.
//! - Encode/decode JSON list values with degrade-to-empty reads.
//!
//! # Invariants
//! - A write replaces the full value stored under a key.
//! - Missing or corrupt slot data reads as an empty list, never as an error.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from slot persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Slot key is blank.
    InvalidKey(String),
    /// Value could not be serialized before writing.
    Encode(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid slot key: `{key}`"),
            Self::Encode(message) => write!(f, "failed to encode slot value: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "slot repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "slot repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "slot repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for string-keyed persistence slots.
pub trait SlotRepository {
    /// Returns the raw value stored under `key`, if any.
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Removes `key`. Removing a missing key is not an error.
    fn remove_slot(&self, key: &str) -> RepoResult<()>;
}

impl<T: SlotRepository + ?Sized> SlotRepository for &T {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).read_slot(key)
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).write_slot(key, value)
    }

    fn remove_slot(&self, key: &str) -> RepoResult<()> {
        (**self).remove_slot(key)
    }
}

/// SQLite-backed slot repository over the `kv_slots` table.
pub struct SqliteSlotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSlotRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_slot_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SlotRepository for SqliteSlotRepository<'_> {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        let key = normalize_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        let key = normalize_key(key)?;
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_slot(&self, key: &str) -> RepoResult<()> {
        let key = normalize_key(key)?;
        self.conn
            .execute("DELETE FROM kv_slots WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Loads a JSON array from `key`.
///
/// Missing, unreadable, or non-array data degrades to an empty list.
pub fn load_json_list<T, S>(repo: &S, key: &str) -> Vec<T>
where
    T: DeserializeOwned,
    S: SlotRepository + ?Sized,
{
    let raw = match repo.read_slot(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("event=slot_load module=repo status=empty key={key}");
            return Vec::new();
        }
        Err(err) => {
            warn!("event=slot_load module=repo status=error key={key} error={err}");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(list) => {
            info!(
                "event=slot_load module=repo status=ok key={key} count={}",
                list.len()
            );
            list
        }
        Err(err) => {
            warn!("event=slot_load module=repo status=corrupt key={key} error={err}");
            Vec::new()
        }
    }
}

/// Serializes `list` as a JSON array and overwrites `key` with it.
pub fn save_json_list<T, S>(repo: &S, key: &str, list: &[T]) -> RepoResult<()>
where
    T: Serialize,
    S: SlotRepository + ?Sized,
{
    let encoded = serde_json::to_string(list).map_err(|err| RepoError::Encode(err.to_string()))?;
    repo.write_slot(key, &encoded)?;
    info!(
        "event=slot_save module=repo status=ok key={key} count={}",
        list.len()
    );
    Ok(())
}

fn normalize_key(key: &str) -> RepoResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}

fn ensure_slot_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "kv_slots")? {
        return Err(RepoError::MissingRequiredTable("kv_slots"));
    }

    for column in ["key", "value", "updated_at"] {
        if !table_has_column(conn, "kv_slots", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "kv_slots",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
