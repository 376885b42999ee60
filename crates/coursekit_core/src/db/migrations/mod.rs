//! Schema migrations tracked in `PRAGMA user_version`.
//!
//! # Invariants
//! - Versions are strictly increasing and start at 1.
//! - All pending steps run in one transaction: an upgrade applies fully or
//!   not at all.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "kv_slots",
    sql: include_str!("0001_kv_slots.sql"),
}];

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    last_version(MIGRATIONS)
}

/// Current `PRAGMA user_version` of `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` up to [`latest_version`]. Returns how many steps ran.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    upgrade(conn, MIGRATIONS)
}

fn last_version(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

fn upgrade(conn: &mut Connection, migrations: &[Migration]) -> DbResult<usize> {
    let found = schema_version(conn)?;
    let supported = last_version(migrations);
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&Migration> = migrations
        .iter()
        .filter(|migration| migration.version > found)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", migration.version))
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;
    Ok(pending.len())
}
