//! Task use-case service.
//!
//! # Responsibility
//! - Provide name/id oriented entry points for CLI and library callers.
//! - Turn silent repository no-matches into `NotFound` where a caller named
//!   a specific task.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Service layer stays storage-agnostic.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoError, RepoResult, TaskListQuery, TaskRepository};

/// Use-case wrapper around a [`TaskRepository`].
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a task and returns its storage-assigned id.
    pub fn add_task(&self, name: impl Into<String>) -> RepoResult<TaskId> {
        self.repo.create(&Task::new(name))
    }

    /// Renames an existing task.
    ///
    /// # Errors
    /// - [`RepoError::NotFound`] when no task has `id`.
    pub fn rename_task(&self, id: TaskId, name: impl Into<String>) -> RepoResult<()> {
        if self.repo.update(&Task::with_id(id, name))? {
            Ok(())
        } else {
            Err(RepoError::NotFound(id))
        }
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.find_by_id(id)
    }

    pub fn all_tasks(&self) -> RepoResult<Vec<Task>> {
        self.repo.find_all()
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        self.repo.list(query)
    }

    /// Removes one task.
    ///
    /// # Errors
    /// - [`RepoError::NotFound`] when no task has `id`.
    pub fn remove_task(&self, id: TaskId) -> RepoResult<()> {
        if self.repo.delete(id)? {
            Ok(())
        } else {
            Err(RepoError::NotFound(id))
        }
    }

    /// Removes every task and returns how many were removed.
    pub fn clear_tasks(&self) -> RepoResult<usize> {
        self.repo.delete_all()
    }

    pub fn task_count(&self) -> RepoResult<u64> {
        self.repo.count()
    }
}
