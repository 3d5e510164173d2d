//! Task storage backend trait and error types.
//!
//! `TaskStore` abstracts the local task list so the reconciler can run
//! against SQLite in production and an in-memory fake in tests.

use thiserror::Error;

use crate::task::{LocalTask, NewTask};

/// Errors that can occur during task store operations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// Validation error (e.g. empty title).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TaskStoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl From<rusqlite::Error> for TaskStoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Trait for task storage backends.
///
/// Implementations don't need to be Sync; `TaskRepository` serializes access
/// through a mutex.
pub trait TaskStore: Send {
    /// List the tasks of one project, oldest first.
    fn list_for_project(&self, project_id: &str) -> TaskStoreResult<Vec<LocalTask>>;

    /// Persist a new task and return it with its generated id.
    ///
    /// # Errors
    /// Returns `TaskStoreError::Validation` if the title is blank.
    fn create(&self, task: &NewTask) -> TaskStoreResult<LocalTask>;

    /// Number of tasks in a project.
    fn count_for_project(&self, project_id: &str) -> TaskStoreResult<usize> {
        Ok(self.list_for_project(project_id)?.len())
    }
}

/// Maximum title length for tasks.
pub const MAX_TITLE_LENGTH: usize = 1000;

/// Validate a task title.
///
/// # Errors
/// Returns `TaskStoreError::Validation` if the title is blank or longer than
/// `MAX_TITLE_LENGTH` characters.
pub fn validate_title(title: &str) -> TaskStoreResult<()> {
    if title.trim().is_empty() {
        return Err(TaskStoreError::validation("Title cannot be empty"));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TaskStoreError::validation(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        )));
    }

    Ok(())
}
