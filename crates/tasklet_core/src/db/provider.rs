//! Connection provider contract and the per-call implementation.
//!
//! # Responsibility
//! - Define how repositories obtain a connection handle.
//! - Provide a provider that opens a fresh connection for every call.
//!
//! # Invariants
//! - Every `acquire` returns an independent handle.
//! - Dropping the handle releases the session, on success and error paths
//!   alike.

use super::open::{mode_label, open_with_settings};
use super::{DbError, DbResult};
use crate::config::{ConnectionString, StoreLocation, StoreSettings};
use log::debug;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

/// Source of database sessions for repositories.
pub trait ConnectionProvider {
    /// Session handle; releases the connection when dropped.
    type Handle: DerefMut<Target = Connection>;

    /// Acquires one connection handle, bootstrapped and migrated.
    fn acquire(&self) -> DbResult<Self::Handle>;
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    type Handle = P::Handle;

    fn acquire(&self) -> DbResult<Self::Handle> {
        (**self).acquire()
    }
}

/// Provider that opens and closes a dedicated connection per call.
///
/// Every call pays the full open + pragma + migration-check cost. Prefer
/// [`super::PooledProvider`] for anything long-lived.
#[derive(Debug, Clone)]
pub struct DirectProvider {
    path: PathBuf,
    settings: StoreSettings,
}

impl DirectProvider {
    /// Creates a provider for a database file with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: StoreSettings::default(),
        }
    }

    /// Creates a provider from a parsed connection string.
    ///
    /// Pool options are accepted but have no effect here.
    ///
    /// # Errors
    /// - [`DbError::UnsupportedMemoryStore`] for `:memory:` stores.
    /// - [`DbError::ConnectionString`] for out-of-bounds settings.
    pub fn from_connection_string(conn_str: &ConnectionString) -> DbResult<Self> {
        conn_str.settings.validate()?;
        match &conn_str.location {
            StoreLocation::Memory => Err(DbError::UnsupportedMemoryStore),
            StoreLocation::File(path) => Ok(Self {
                path: path.clone(),
                settings: conn_str.settings.clone(),
            }),
        }
    }
}

impl ConnectionProvider for DirectProvider {
    type Handle = DirectConnection;

    fn acquire(&self) -> DbResult<DirectConnection> {
        let location = StoreLocation::File(self.path.clone());
        let conn = open_with_settings(&location, &self.settings)?;
        Ok(DirectConnection {
            conn,
            mode: mode_label(&location),
        })
    }
}

/// Owned connection handed out by [`DirectProvider`]; closed on drop.
#[derive(Debug)]
pub struct DirectConnection {
    conn: Connection,
    mode: &'static str,
}

impl Deref for DirectConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for DirectConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for DirectConnection {
    fn drop(&mut self) {
        debug!("event=db_release module=db status=ok mode={}", self.mode);
    }
}
