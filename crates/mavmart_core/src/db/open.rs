//! Store handle construction.
//!
//! # Invariants
//! - Every handle returned here enforces foreign keys (listing rows cascade
//!   with their seller) and sits at the latest schema version.
//! - Nothing is cached; each call yields a fresh owned connection.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the store file at `path` and migrates it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    prepare("file", Connection::open(path))
}

/// Opens a private in-memory store at the latest layout.
pub fn open_db_in_memory() -> DbResult<Connection> {
    prepare("memory", Connection::open_in_memory())
}

fn prepare(kind: &'static str, opened: rusqlite::Result<Connection>) -> DbResult<Connection> {
    let started = Instant::now();
    let result: DbResult<Connection> = opened.map_err(DbError::from).and_then(|mut conn| {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        apply_migrations(&mut conn)?;
        Ok(conn)
    });

    let elapsed_ms = started.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=db_open module=db status=ok kind={kind} duration_ms={elapsed_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error kind={kind} duration_ms={elapsed_ms} error={err}"
        ),
    }
    result
}
