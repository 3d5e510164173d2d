//! One board-to-project sync run.
//!
//! `sync_board` drives the pipeline (resolve board, fetch, filter, index,
//! reconcile, assemble) against any `BoardSource`; `run_sync` wires in the
//! YouTrack client.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracksync_core::{SyncConfig, SyncError};

use crate::board::{BoardRef, BoardSource};
use crate::index::ExistingTaskIndex;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::repository::TaskRepository;
use crate::state_filter::filter_open;
use crate::youtrack::{ClientSettings, YouTrackClient};

pub const DEFAULT_STATE_FIELD: &str = "State";
pub const DEFAULT_OPEN_VALUE: &str = "Open";
pub const DEFAULT_CREATED_TITLES_CAP: usize = 3;

/// Parameters of one sync run.
///
/// The board is named either by `board_url` or by the three explicit parts.
/// An absent `state_field` or `open_value` lets the caller fill in its own
/// default; `sync_board` falls back to "State" and "Open".
#[derive(Clone, Deserialize)]
pub struct SyncRequest {
    pub project_id: String,
    #[serde(default)]
    pub board_url: Option<String>,
    #[serde(default)]
    pub youtrack_base_url: Option<String>,
    #[serde(default)]
    pub agile_id: Option<String>,
    #[serde(default)]
    pub sprint_id: Option<String>,
    #[serde(default)]
    pub youtrack_token: String,
    #[serde(default)]
    pub state_field: Option<String>,
    #[serde(default)]
    pub open_value: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl fmt::Debug for SyncRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRequest")
            .field("project_id", &self.project_id)
            .field("board_url", &self.board_url)
            .field("youtrack_base_url", &self.youtrack_base_url)
            .field("agile_id", &self.agile_id)
            .field("sprint_id", &self.sprint_id)
            .field("youtrack_token", &"<redacted>")
            .field("state_field", &self.state_field)
            .field("open_value", &self.open_value)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl SyncRequest {
    /// Request for `board_url` with the default state field and open value.
    pub fn new(
        project_id: impl Into<String>,
        board_url: impl Into<String>,
        youtrack_token: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            board_url: Some(board_url.into()),
            youtrack_base_url: None,
            agile_id: None,
            sprint_id: None,
            youtrack_token: youtrack_token.into(),
            state_field: None,
            open_value: None,
            dry_run: false,
        }
    }

    pub fn state_field(&self) -> &str {
        self.state_field.as_deref().unwrap_or(DEFAULT_STATE_FIELD)
    }

    pub fn open_value(&self) -> &str {
        self.open_value.as_deref().unwrap_or(DEFAULT_OPEN_VALUE)
    }

    /// Check the request before anything touches the network.
    ///
    /// # Errors
    /// `MissingCredential` for a blank token, `PersistenceError` for a blank
    /// project id (no task could ever be stored).
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.youtrack_token.trim().is_empty() {
            return Err(SyncError::MissingCredential);
        }
        if self.project_id.trim().is_empty() {
            return Err(SyncError::persistence("a project id is required"));
        }
        Ok(())
    }

    /// Resolve the sprint this request points at.
    pub fn board_ref(&self) -> Result<BoardRef, SyncError> {
        if let Some(url) = self.board_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return BoardRef::parse(url);
        }
        match (
            self.youtrack_base_url.as_deref(),
            self.agile_id.as_deref(),
            self.sprint_id.as_deref(),
        ) {
            (Some(base), Some(agile), Some(sprint)) => BoardRef::from_parts(base, agile, sprint),
            _ => Err(SyncError::invalid_board(
                "either board_url or youtrack_base_url, agile_id and sprint_id are required",
            )),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub open_issues_total: usize,
    pub created: usize,
    pub skipped_existing: usize,
    pub dry_run: bool,
    /// First few created titles, in creation order
    pub created_titles: Vec<String>,
}

/// Run-wide knobs taken from configuration rather than the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub created_titles_cap: usize,
    pub prefix_titles: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            created_titles_cap: DEFAULT_CREATED_TITLES_CAP,
            prefix_titles: false,
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            created_titles_cap: config.created_titles_cap,
            prefix_titles: config.prefix_titles_with_issue_id,
        }
    }
}

pub fn assemble(
    open_issues_total: usize,
    outcome: &ReconcileOutcome,
    dry_run: bool,
    created_titles_cap: usize,
) -> SyncResult {
    SyncResult {
        open_issues_total,
        created: outcome.created.len(),
        skipped_existing: outcome.skipped_existing,
        dry_run,
        created_titles: outcome
            .created
            .iter()
            .take(created_titles_cap)
            .map(|c| c.title.clone())
            .collect(),
    }
}

/// Sync the open issues of one sprint into a project's task list.
pub async fn sync_board<B: BoardSource>(
    board: &B,
    tasks: &TaskRepository,
    request: &SyncRequest,
    options: &SyncOptions,
) -> Result<SyncResult, SyncError> {
    request.validate()?;
    let board_ref = request.board_ref()?;

    tracing::info!(
        "Syncing {} into project {}{}",
        board_ref,
        request.project_id,
        if request.dry_run { " (dry run)" } else { "" }
    );

    let issues = board.fetch_board_issues(&board_ref).await?;
    let fetched = issues.len();
    let open = filter_open(issues, request.state_field(), request.open_value());
    tracing::info!(
        "{} of {} issues have {} = {}",
        open.len(),
        fetched,
        request.state_field(),
        request.open_value()
    );

    let index = ExistingTaskIndex::load(tasks, &request.project_id).await?;
    let outcome = Reconciler::new(tasks, &request.project_id, request.dry_run)
        .with_prefixed_titles(options.prefix_titles)
        .reconcile(&open, &index)
        .await?;

    let result = assemble(open.len(), &outcome, request.dry_run, options.created_titles_cap);
    tracing::info!(
        "Sync finished: {} created, {} already present",
        result.created,
        result.skipped_existing
    );
    Ok(result)
}

/// Sync against YouTrack using the request's token.
pub async fn run_sync(
    request: &SyncRequest,
    tasks: &TaskRepository,
    settings: &ClientSettings,
    options: &SyncOptions,
) -> Result<SyncResult, SyncError> {
    request.validate()?;
    let client = YouTrackClient::new(&request.youtrack_token, settings)?;
    sync_board(&client, tasks, request, options).await
}
