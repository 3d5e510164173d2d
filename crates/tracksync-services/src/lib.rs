pub mod board;
pub mod index;
pub mod issue;
pub mod reconcile;
pub mod repository;
pub mod run_state;
pub mod sqlite_store;
pub mod state_filter;
pub mod sync;
pub mod task;
pub mod task_store;
pub mod youtrack;

pub use board::{BoardRef, BoardSource};
pub use index::ExistingTaskIndex;
pub use issue::{IssueField, RemoteIssue};
pub use reconcile::{CreatedTask, ReconcileOutcome, Reconciler};
pub use repository::TaskRepository;
pub use run_state::RunState;
pub use sqlite_store::SqliteTaskStore;
pub use state_filter::{filter_open, is_open_issue};
pub use sync::{assemble, run_sync, sync_board, SyncOptions, SyncRequest, SyncResult};
pub use task::{LocalTask, NewTask, TaskStatus};
pub use task_store::{TaskStore, TaskStoreError, TaskStoreResult};
pub use youtrack::{ClientSettings, YouTrackClient};
