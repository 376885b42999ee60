use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the database file at `path` and migrates it.
///
/// Missing parent directories are created first, so a fresh `db_path` from
/// config works on the first run.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(source) = std::fs::create_dir_all(parent) {
            let err = DbError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            };
            error!("event=db_open module=db status=error mode=file error={err}");
            return Err(err);
        }
    }

    let conn = Connection::open(path).map_err(|err| {
        error!("event=db_open module=db status=error mode=file error={err}");
        DbError::from(err)
    })?;
    prepare(conn, "file", started_at)
}

/// Opens a private in-memory database. Used by tests.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    let conn = Connection::open_in_memory()?;
    prepare(conn, "memory", started_at)
}

fn prepare(mut conn: Connection, mode: &str, started_at: Instant) -> DbResult<Connection> {
    let applied = conn
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(DbError::from)
        .and_then(|()| apply_migrations(&mut conn));

    match applied {
        Ok(steps) => {
            let duration_ms = started_at.elapsed().as_millis();
            info!(
                "event=db_open module=db status=ok mode={mode} migrations_applied={steps} \
                 duration_ms={duration_ms}"
            );
            Ok(conn)
        }
        Err(err) => {
            error!("event=db_open module=db status=error mode={mode} error={err}");
            Err(err)
        }
    }
}
