//! Create-or-skip decision for each open issue.

use std::collections::HashSet;

use serde::Serialize;
use tracksync_core::SyncError;

use crate::index::ExistingTaskIndex;
use crate::issue::RemoteIssue;
use crate::repository::TaskRepository;
use crate::task::{issue_title_prefix, NewTask, TaskStatus};
use crate::task_store::MAX_TITLE_LENGTH;

/// A task created (or, in a dry run, that would be created) for an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTask {
    pub source_issue_id: String,
    pub title: String,
    /// Id of the persisted task; `None` for a dry-run preview
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// In creation order
    pub created: Vec<CreatedTask>,
    pub skipped_existing: usize,
}

pub struct Reconciler<'a> {
    tasks: &'a TaskRepository,
    project_id: &'a str,
    dry_run: bool,
    prefix_titles: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(tasks: &'a TaskRepository, project_id: &'a str, dry_run: bool) -> Self {
        Self {
            tasks,
            project_id,
            dry_run,
            prefix_titles: false,
        }
    }

    /// Title new tasks `[<issue id>] <summary>`.
    pub fn with_prefixed_titles(mut self, enabled: bool) -> Self {
        self.prefix_titles = enabled;
        self
    }

    /// Task payload for an issue.
    pub fn new_task(&self, issue: &RemoteIssue) -> NewTask {
        let summary = if issue.title.trim().is_empty() {
            issue.id.as_str()
        } else {
            issue.title.as_str()
        };
        let title = if self.prefix_titles {
            format!("{}{summary}", issue_title_prefix(&issue.id))
        } else {
            summary.to_string()
        };
        let title = clamp_title(title);

        let body = issue.description.as_deref().filter(|d| !d.trim().is_empty());
        let description = match (issue.url.as_deref(), body) {
            (Some(url), Some(body)) => Some(format!("YouTrack: {url}\n\n{body}")),
            (Some(url), None) => Some(format!("YouTrack: {url}")),
            (None, body) => body.map(str::to_string),
        };

        NewTask {
            project_id: self.project_id.to_string(),
            source_issue_id: Some(issue.id.clone()),
            title,
            description,
            status: TaskStatus::Todo,
        }
    }

    /// Create a task for every open issue not yet in `index`.
    ///
    /// A dry run only records previews. A store failure aborts the run; tasks
    /// created before it stay committed.
    pub async fn reconcile(
        &self,
        open_issues: &[RemoteIssue],
        index: &ExistingTaskIndex,
    ) -> Result<ReconcileOutcome, SyncError> {
        let mut outcome = ReconcileOutcome::default();
        let mut handled: HashSet<&str> = HashSet::new();

        for issue in open_issues {
            if index.contains(&issue.id) {
                tracing::debug!("Skipping {}: already synced", issue.id);
                outcome.skipped_existing += 1;
                continue;
            }
            if !handled.insert(issue.id.as_str()) {
                tracing::debug!("Skipping {}: listed twice on the board", issue.id);
                outcome.skipped_existing += 1;
                continue;
            }

            let task = self.new_task(issue);

            if self.dry_run {
                tracing::debug!("Would create task for {}: {}", issue.id, task.title);
                outcome.created.push(CreatedTask {
                    source_issue_id: issue.id.clone(),
                    title: task.title,
                    task_id: None,
                });
                continue;
            }

            match self.tasks.create(task).await {
                Ok(created) => {
                    tracing::debug!("Created task {} for {}", created.id, issue.id);
                    outcome.created.push(CreatedTask {
                        source_issue_id: issue.id.clone(),
                        title: created.title,
                        task_id: Some(created.id),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Aborting after {} created tasks: {} failed: {}",
                        outcome.created.len(),
                        issue.id,
                        e
                    );
                    return Err(match e {
                        SyncError::PersistenceError(detail) => {
                            SyncError::persistence(format!("task for {}: {detail}", issue.id))
                        }
                        other => other,
                    });
                }
            }
        }

        Ok(outcome)
    }
}

/// Cut a title to the store's limit, on a char boundary.
fn clamp_title(mut title: String) -> String {
    let end = title.char_indices().nth(MAX_TITLE_LENGTH).map(|(i, _)| i);
    if let Some(end) = end {
        title.truncate(end);
    }
    title
}
