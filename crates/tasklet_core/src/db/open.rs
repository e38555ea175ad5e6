//! Single-connection bootstrap for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply per-connection pragmas from [`StoreSettings`].
//! - Run schema migrations before a connection is handed out.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Every open attempt emits one `db_open` start event and one result event.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::{StoreLocation, StoreSettings};
use log::{debug, error};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens a SQLite database file with default settings and applies pending
/// migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with_settings(
        &StoreLocation::File(path.as_ref().to_path_buf()),
        &StoreSettings::default(),
    )
}

/// Opens a private in-memory database and applies all migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with_settings(&StoreLocation::Memory, &StoreSettings::default())
}

pub(crate) fn open_with_settings(
    location: &StoreLocation,
    settings: &StoreSettings,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = mode_label(location);
    debug!("event=db_open module=db status=start mode={mode}");

    let opened = match location {
        StoreLocation::Memory => Connection::open_in_memory(),
        StoreLocation::File(path) => Connection::open(path),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    let bootstrapped = configure_connection(&mut conn, settings)
        .map_err(DbError::from)
        .and_then(|()| apply_migrations(&mut conn));
    match bootstrapped {
        Ok(()) => {
            debug!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

/// Applies pragmas every tasklet connection relies on.
///
/// Shared by the per-call opener and the pool's connection initializer.
pub(crate) fn configure_connection(
    conn: &mut Connection,
    settings: &StoreSettings,
) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", settings.foreign_keys)?;
    conn.busy_timeout(settings.busy_timeout)?;
    Ok(())
}

pub(crate) fn mode_label(location: &StoreLocation) -> &'static str {
    match location {
        StoreLocation::Memory => "memory",
        StoreLocation::File(_) => "file",
    }
}
