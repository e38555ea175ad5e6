//! Core task storage for tasklet.
//!
//! A pooled SQLite connection provider plus a repository issuing one
//! parameterized statement per task operation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConnectionString, ConnectionStringError, StoreLocation, StoreSettings};
pub use db::{
    connect, ConnectionProvider, DbError, DbResult, DirectProvider, PoolState, PooledProvider,
};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::task::{Task, TaskId, TaskValidationError, MAX_TASK_NAME_CHARS};
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskListQuery, TaskRepository,
};
pub use service::task_service::TaskService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
