//! SQLite storage bootstrap, connection providers and schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite connections for tasklet.
//! - Hand out connection handles through [`ConnectionProvider`].
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No handle is returned before migrations succeed.
//! - Dropping a handle releases its session.

use crate::config::ConnectionStringError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod pool;
mod provider;

pub use open::{open_db, open_db_in_memory};
pub use pool::{connect, PoolState, PooledProvider};
pub use provider::{ConnectionProvider, DirectConnection, DirectProvider};

pub type DbResult<T> = Result<T, DbError>;

/// Store-access error for connection, pool and statement failures.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Pool(r2d2::Error),
    ConnectionString(ConnectionStringError),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Per-call providers cannot serve `:memory:` stores; every handle would
    /// see its own empty database.
    UnsupportedMemoryStore,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "connection pool error: {err}"),
            Self::ConnectionString(err) => write!(f, "invalid connection string: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::UnsupportedMemoryStore => {
                write!(f, "in-memory stores require a pooled connection provider")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::ConnectionString(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::UnsupportedMemoryStore => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}

impl From<ConnectionStringError> for DbError {
    fn from(value: ConnectionStringError) -> Self {
        Self::ConnectionString(value)
    }
}
