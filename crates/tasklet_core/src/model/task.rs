//! Task domain model.
//!
//! # Responsibility
//! - Define the record persisted by the task repository.
//! - Validate record shape before any SQL mutation.
//!
//! # Invariants
//! - `id` is `None` until the first successful insert.
//! - `name` holds at least one non-whitespace character.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned task identifier (`tasks.id` rowid).
pub type TaskId = i64;

/// Upper bound for task names, counted in characters.
pub const MAX_TASK_NAME_CHARS: usize = 255;

/// Shape violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyName,
    NameTooLong { max: usize, actual: usize },
    /// Update/delete paths need a persisted id.
    MissingId,
    /// Create paths refuse records that already carry an id.
    IdAlreadyAssigned(TaskId),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "task name must not be blank"),
            Self::NameTooLong { max, actual } => {
                write!(f, "task name has {actual} characters; limit is {max}")
            }
            Self::MissingId => write!(f, "task has no id; persist it first"),
            Self::IdAlreadyAssigned(id) => write!(f, "task already has id {id}"),
        }
    }
}

impl Error for TaskValidationError {}

/// One row of the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub name: String,
}

impl Task {
    /// Creates an unsaved task.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Creates a task carrying a storage id, e.g. for updates by id.
    pub fn with_id(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Checks name constraints.
    ///
    /// Id presence is checked by the operation that cares about it.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.name.trim().is_empty() {
            return Err(TaskValidationError::EmptyName);
        }
        let actual = self.name.chars().count();
        if actual > MAX_TASK_NAME_CHARS {
            return Err(TaskValidationError::NameTooLong {
                max: MAX_TASK_NAME_CHARS,
                actual,
            });
        }
        Ok(())
    }

    /// Returns the id or [`TaskValidationError::MissingId`].
    pub fn require_id(&self) -> Result<TaskId, TaskValidationError> {
        self.id.ok_or(TaskValidationError::MissingId)
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskValidationError, MAX_TASK_NAME_CHARS};

    #[test]
    fn new_task_is_unsaved() {
        let task = Task::new("learn Spring");
        assert_eq!(task.id, None);
        assert!(!task.is_persisted());
        assert_eq!(task.require_id(), Err(TaskValidationError::MissingId));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(Task::new("").validate(), Err(TaskValidationError::EmptyName));
        assert_eq!(
            Task::new(" \t\n").validate(),
            Err(TaskValidationError::EmptyName)
        );
    }

    #[test]
    fn name_limit_counts_characters_not_bytes() {
        let at_limit = Task::new("é".repeat(MAX_TASK_NAME_CHARS));
        assert!(at_limit.validate().is_ok());

        let over = Task::new("x".repeat(MAX_TASK_NAME_CHARS + 1));
        assert_eq!(
            over.validate(),
            Err(TaskValidationError::NameTooLong {
                max: MAX_TASK_NAME_CHARS,
                actual: MAX_TASK_NAME_CHARS + 1
            })
        );
    }

    #[test]
    fn serde_omits_missing_id() {
        let unsaved = serde_json::to_value(Task::new("draft")).unwrap();
        assert_eq!(unsaved, serde_json::json!({ "name": "draft" }));

        let saved: Task = serde_json::from_str(r#"{"id":7,"name":"ship"}"#).unwrap();
        assert_eq!(saved, Task::with_id(7, "ship"));
    }
}
