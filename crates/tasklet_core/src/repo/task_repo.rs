//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide one parameterized statement per task operation.
//! - Keep SQL and connection handling inside the persistence boundary.
//!
//! # Invariants
//! - Every operation acquires exactly one handle and releases it before
//!   returning, whether the statement succeeded or not.
//! - Write paths call `Task::validate()` before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - No transaction spans two calls.

use crate::db::{ConnectionProvider, DbError};
use crate::model::task::{Task, TaskId, TaskValidationError};
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const TASK_SELECT_SQL: &str = "SELECT id, name FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
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

/// Filter and pagination options for [`TaskRepository::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Substring match on `name`, ASCII case-insensitive.
    pub name_contains: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    /// Inserts an unsaved task and returns the id storage assigned to it.
    fn create(&self, task: &Task) -> RepoResult<TaskId>;
    /// Renames the row matching `task.id`.
    ///
    /// Returns `Ok(false)` when no row matched; the table is left unchanged.
    fn update(&self, task: &Task) -> RepoResult<bool>;
    /// Removes every row. Irreversible. Returns the number of removed rows.
    fn delete_all(&self) -> RepoResult<usize>;
    /// Reads the whole table, ordered by id.
    fn find_all(&self) -> RepoResult<Vec<Task>>;
    fn find_by_id(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Removes one row. Returns `Ok(false)` when no row matched.
    fn delete(&self, id: TaskId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
    fn list(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository over an injected connection provider.
pub struct SqliteTaskRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> SqliteTaskRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: ConnectionProvider> TaskRepository for SqliteTaskRepository<P> {
    fn create(&self, task: &Task) -> RepoResult<TaskId> {
        observe("task_create", || {
            task.validate()?;
            if let Some(id) = task.id {
                return Err(TaskValidationError::IdAlreadyAssigned(id).into());
            }

            let conn = self.provider.acquire()?;
            let id = conn.query_row(
                "INSERT INTO tasks (name) VALUES (?1) RETURNING id;",
                params![task.name.as_str()],
                |row| row.get::<_, TaskId>(0),
            )?;
            debug!("event=task_create module=repo status=assigned task_id={id}");
            Ok(id)
        })
    }

    fn update(&self, task: &Task) -> RepoResult<bool> {
        observe("task_update", || {
            task.validate()?;
            let id = task.require_id()?;

            let conn = self.provider.acquire()?;
            let changed = conn.execute(
                "UPDATE tasks SET name = ?1 WHERE id = ?2;",
                params![task.name.as_str(), id],
            )?;
            if changed == 0 {
                debug!("event=task_update module=repo status=no_match task_id={id}");
            }
            Ok(changed > 0)
        })
    }

    fn delete_all(&self) -> RepoResult<usize> {
        observe("task_delete_all", || {
            let conn = self.provider.acquire()?;
            let removed = conn.execute("DELETE FROM tasks;", [])?;
            debug!("event=task_delete_all module=repo status=removed count={removed}");
            Ok(removed)
        })
    }

    fn find_all(&self) -> RepoResult<Vec<Task>> {
        observe("task_find_all", || {
            let conn = self.provider.acquire()?;
            let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(parse_task_row(row)?);
            }
            Ok(tasks)
        })
    }

    fn find_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        observe("task_find_by_id", || {
            let conn = self.provider.acquire()?;
            let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query(params![id])?;
            let task = match rows.next()? {
                Some(row) => Some(parse_task_row(row)?),
                None => None,
            };
            Ok(task)
        })
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        observe("task_delete", || {
            let conn = self.provider.acquire()?;
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1;", params![id])?;
            Ok(changed > 0)
        })
    }

    fn count(&self) -> RepoResult<u64> {
        observe("task_count", || {
            let conn = self.provider.acquire()?;
            let count = conn.query_row("SELECT COUNT(*) FROM tasks;", [], |row| {
                row.get::<_, i64>(0)
            })?;
            u64::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
        })
    }

    fn list(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        observe("task_list", || {
            let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
            let mut bind_values: Vec<Value> = Vec::new();

            if let Some(needle) = query.name_contains.as_deref() {
                sql.push_str(" AND instr(lower(name), lower(?)) > 0");
                bind_values.push(Value::Text(needle.to_string()));
            }

            sql.push_str(" ORDER BY id ASC");

            if let Some(limit) = query.limit {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                if query.offset > 0 {
                    sql.push_str(" OFFSET ?");
                    bind_values.push(Value::Integer(i64::from(query.offset)));
                }
            } else if query.offset > 0 {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }

            let conn = self.provider.acquire()?;
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(parse_task_row(row)?);
            }
            Ok(tasks)
        })
    }
}

/// Runs one repository operation and logs its outcome and duration.
fn observe<T>(event: &'static str, op: impl FnOnce() -> RepoResult<T>) -> RepoResult<T> {
    let started_at = Instant::now();
    let result = op();
    match &result {
        Ok(_) => debug!(
            "event={event} module=repo status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={event} module=repo status=error duration_ms={} error_code={} error={err}",
            started_at.elapsed().as_millis(),
            error_code(err)
        ),
    }
    result
}

fn error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => "validation_failed",
        RepoError::Db(_) => "store_access_failed",
        RepoError::NotFound(_) => "not_found",
        RepoError::InvalidData(_) => "invalid_data",
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let task = Task {
        id: Some(row.get("id")?),
        name: row.get("name")?,
    };
    task.validate().map_err(|err| {
        RepoError::InvalidData(format!("row {:?} in tasks: {err}", task.id))
    })?;
    Ok(task)
}
