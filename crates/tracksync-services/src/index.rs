//! Lookup of issues that already have a local task.

use std::collections::HashSet;

use tracksync_core::SyncError;

use crate::repository::TaskRepository;
use crate::task::LocalTask;

/// Source issue ids already synced into one project.
///
/// Built fresh for every run from the current store contents; never cached.
#[derive(Debug, Clone, Default)]
pub struct ExistingTaskIndex {
    source_ids: HashSet<String>,
}

impl ExistingTaskIndex {
    /// Index the tasks that were created from a remote issue.
    pub fn from_tasks(tasks: &[LocalTask]) -> Self {
        let source_ids = tasks
            .iter()
            .filter_map(|task| task.source_issue_id.clone())
            .collect();
        Self { source_ids }
    }

    /// Read the project's tasks and index them.
    ///
    /// The query is scoped to `project_id`, so the same issue id synced into
    /// another project does not count as existing here.
    pub async fn load(tasks: &TaskRepository, project_id: &str) -> Result<Self, SyncError> {
        let existing = tasks.list_for_project(project_id).await?;
        let index = Self::from_tasks(&existing);
        tracing::debug!(
            "Project {} has {} tasks, {} synced from issues",
            project_id,
            existing.len(),
            index.len()
        );
        Ok(index)
    }

    pub fn contains(&self, issue_id: &str) -> bool {
        self.source_ids.contains(issue_id)
    }

    pub fn len(&self) -> usize {
        self.source_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_ids.is_empty()
    }
}
