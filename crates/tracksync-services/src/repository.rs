//! Async access to a task store.
//!
//! `TaskRepository` wraps any `TaskStore` behind a mutex and runs each call
//! on the blocking thread pool, so the sync pipeline can await store writes
//! the same way it awaits the tracker.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracksync_core::SyncError;

use crate::sqlite_store::SqliteTaskStore;
use crate::task::{LocalTask, NewTask};
use crate::task_store::{TaskStore, TaskStoreResult};

/// Shared handle to the local task store.
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<Mutex<dyn TaskStore>>,
}

impl TaskRepository {
    /// Wrap an existing store.
    pub fn new<S: TaskStore + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Open (or create) the SQLite task database at `path`.
    pub fn open_sqlite(path: &Path) -> Result<Self> {
        Ok(Self::new(SqliteTaskStore::open(path)?))
    }

    /// Tasks of one project, oldest first.
    pub async fn list_for_project(&self, project_id: &str) -> Result<Vec<LocalTask>, SyncError> {
        let project_id = project_id.to_string();
        self.run_blocking(move |store| store.list_for_project(&project_id)).await
    }

    /// Persist a new task.
    pub async fn create(&self, task: NewTask) -> Result<LocalTask, SyncError> {
        self.run_blocking(move |store| store.create(&task)).await
    }

    /// Number of tasks in a project.
    pub async fn count_for_project(&self, project_id: &str) -> Result<usize, SyncError> {
        let project_id = project_id.to_string();
        self.run_blocking(move |store| store.count_for_project(&project_id)).await
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TaskStore) -> TaskStoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let guard = store.lock();
            op(&*guard)
        })
        .await
        .map_err(|e| SyncError::persistence(format!("task store worker failed: {e}")))?
        .map_err(|e| SyncError::persistence(e.to_string()))
    }
}
