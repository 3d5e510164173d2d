// crates/tracksync-services/src/task.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status in the local task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Backlog,
    #[default]
    Todo,
    InProgress,
    Blocked,
    Review,
    Done,
}

impl TaskStatus {
    /// Storage name of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inprogress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Parse a stored status.
    ///
    /// Accepts both the bare name and the JSON-quoted form written by older
    /// databases. Unknown values fall back to `Todo`.
    pub fn from_stored(value: &str) -> Self {
        match value.trim().trim_matches('"') {
            "backlog" => TaskStatus::Backlog,
            "inprogress" | "in_progress" | "in-progress" => TaskStatus::InProgress,
            "blocked" => TaskStatus::Blocked,
            "review" => TaskStatus::Review,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }
}

/// Local task representation (belongs to a project)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTask {
    pub id: String,
    pub project_id: String,
    /// Id of the remote issue this task was synced from; `None` for tasks
    /// created by hand
    pub source_issue_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub project_id: String,
    pub source_issue_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            source_issue_id: None,
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
        }
    }
}

/// Title prefix marking a task synced from `issue_id`: `[PRJ-1] `.
pub fn issue_title_prefix(issue_id: &str) -> String {
    format!("[{issue_id}] ")
}

/// Extract the issue id from a `[PRJ-1] Summary` style title.
///
/// Only `<PROJECT>-<number>` ids count, so hand-written tags such as
/// `[WIP] ...` are not mistaken for synced issues.
pub fn issue_id_from_title(title: &str) -> Option<&str> {
    let rest = title.strip_prefix('[')?;
    let end = rest.find("] ")?;
    let id = &rest[..end];
    is_issue_id(id).then_some(id)
}

fn is_issue_id(id: &str) -> bool {
    let Some((project, number)) = id.split_once('-') else {
        return false;
    };
    let mut project_chars = project.chars();
    project_chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && project_chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
}
