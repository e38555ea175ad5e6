//! Pooled connection provider backed by `r2d2`.
//!
//! # Responsibility
//! - Build one shared pool from a [`ConnectionString`].
//! - Run migrations once per pool instead of once per call.
//!
//! # Invariants
//! - Every pooled connection carries the configured pragmas.
//! - In-memory pools hold exactly one connection that never expires, so the
//!   database lives as long as the pool.
//! - Clones share the same pool.

use super::migrations::apply_migrations;
use super::open::{configure_connection, mode_label};
use super::provider::ConnectionProvider;
use super::DbResult;
use crate::config::{ConnectionString, StoreLocation};
use log::{error, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Instant;

type SqlitePool = Pool<SqliteConnectionManager>;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Live connections, idle or checked out.
    pub connections: u32,
    pub idle_connections: u32,
}

/// Connection provider handing out connections from a shared pool.
#[derive(Clone)]
pub struct PooledProvider {
    pool: SqlitePool,
    conn_str: ConnectionString,
}

impl PooledProvider {
    /// Builds the pool and migrates the schema.
    ///
    /// # Errors
    /// - Pool errors when the store cannot be opened within
    ///   `CONNECT_TIMEOUT_MS`.
    /// - Migration errors, including a schema newer than this build.
    /// - [`super::DbError::ConnectionString`] when settings assembled in code
    ///   are out of bounds.
    pub fn build(conn_str: &ConnectionString) -> DbResult<Self> {
        let started_at = Instant::now();
        let mode = mode_label(&conn_str.location);
        info!(
            "event=pool_build module=db status=start mode={mode} max_size={}",
            conn_str.settings.pool_max_size
        );

        match build_pool(conn_str) {
            Ok(pool) => {
                info!(
                    "event=pool_build module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    pool,
                    conn_str: conn_str.clone(),
                })
            }
            Err(err) => {
                error!(
                    "event=pool_build module=db status=error mode={mode} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Builds a single-connection pool over a private in-memory store.
    pub fn in_memory() -> DbResult<Self> {
        Self::build(&ConnectionString::memory())
    }

    pub fn connection_string(&self) -> &ConnectionString {
        &self.conn_str
    }

    pub fn state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }
}

impl ConnectionProvider for PooledProvider {
    type Handle = PooledConnection<SqliteConnectionManager>;

    fn acquire(&self) -> DbResult<Self::Handle> {
        Ok(self.pool.get()?)
    }
}

/// Parses `url` and builds a [`PooledProvider`] for it.
pub fn connect(url: &str) -> DbResult<PooledProvider> {
    let conn_str = ConnectionString::parse(url)?;
    PooledProvider::build(&conn_str)
}

fn build_pool(conn_str: &ConnectionString) -> DbResult<SqlitePool> {
    // r2d2's builder asserts on these bounds.
    conn_str.validate()?;

    let manager = match &conn_str.location {
        StoreLocation::Memory => SqliteConnectionManager::memory(),
        StoreLocation::File(path) => SqliteConnectionManager::file(path),
    };
    let pragmas = conn_str.settings.clone();
    let manager = manager.with_init(move |conn| configure_connection(conn, &pragmas));

    let settings = &conn_str.settings;
    let mut builder = Pool::builder()
        .max_size(settings.pool_max_size)
        .min_idle(settings.pool_min_idle)
        .connection_timeout(settings.connect_timeout);
    if conn_str.location.is_memory() {
        builder = builder.idle_timeout(None).max_lifetime(None);
    }
    let pool = builder.build(manager)?;

    let mut conn = pool.get()?;
    apply_migrations(&mut conn)?;
    Ok(pool)
}
