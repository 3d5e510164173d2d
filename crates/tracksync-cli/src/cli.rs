//! CLI argument definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracksync_core::Config;
use tracksync_services::SyncRequest;

/// Sync the open issues of a YouTrack sprint into a local project's tasks.
#[derive(Debug, Parser)]
#[command(name = "tracksync", version, about = "Sync open YouTrack issues into local tasks")]
pub struct Cli {
    /// Local project receiving the tasks.
    #[arg(long, env = "TRACKSYNC_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Board link naming a sprint, e.g. https://host/agiles/108-4/109-7
    #[arg(long, env = "YOUTRACK_BOARD_URL", conflicts_with = "youtrack_base_url")]
    pub board_url: Option<String>,

    /// Tracker root, used with --agile-id and --sprint-id instead of --board-url.
    #[arg(long, env = "YOUTRACK_BASE_URL", requires_all = ["agile_id", "sprint_id"])]
    pub youtrack_base_url: Option<String>,

    #[arg(long, env = "YOUTRACK_AGILE_ID")]
    pub agile_id: Option<String>,

    #[arg(long, env = "YOUTRACK_SPRINT_ID")]
    pub sprint_id: Option<String>,

    /// Permanent YouTrack token.
    #[arg(long, env = "YOUTRACK_TOKEN", hide_env_values = true)]
    pub youtrack_token: Option<String>,

    /// Custom field holding the issue state (config default: "State").
    #[arg(long)]
    pub state_field: Option<String>,

    /// State value counted as open, matched exactly (config default: "Open").
    #[arg(long)]
    pub open_value: Option<String>,

    /// Report what would be created without writing any task.
    #[arg(long)]
    pub dry_run: bool,

    /// Task database path, overriding the configured one.
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Configuration file path.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read the whole sync request from a JSON file instead of flags.
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = [
            "project_id",
            "board_url",
            "youtrack_base_url",
            "agile_id",
            "sprint_id",
            "youtrack_token",
            "state_field",
            "open_value",
        ]
    )]
    pub request: Option<PathBuf>,
}

impl Cli {
    /// Build the sync request from `--request` or from the individual flags.
    ///
    /// `--dry-run` applies in both cases. A state field or open value the
    /// request leaves out comes from configuration.
    pub fn sync_request(&self, config: &Config) -> Result<SyncRequest> {
        let mut request = match &self.request {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read request file {}", path.display()))?;
                serde_json::from_str::<SyncRequest>(&raw)
                    .with_context(|| format!("Invalid request file {}", path.display()))?
            }
            None => self.request_from_flags()?,
        };
        request
            .state_field
            .get_or_insert_with(|| config.youtrack.default_state_field.clone());
        request
            .open_value
            .get_or_insert_with(|| config.youtrack.default_open_value.clone());
        request.dry_run |= self.dry_run;
        Ok(request)
    }

    fn request_from_flags(&self) -> Result<SyncRequest> {
        let project_id = self
            .project_id
            .clone()
            .context("--project-id (or TRACKSYNC_PROJECT_ID) is required")?;

        Ok(SyncRequest {
            project_id,
            board_url: self.board_url.clone(),
            youtrack_base_url: self.youtrack_base_url.clone(),
            agile_id: self.agile_id.clone(),
            sprint_id: self.sprint_id.clone(),
            youtrack_token: self.youtrack_token.clone().unwrap_or_default(),
            state_field: self.state_field.clone(),
            open_value: self.open_value.clone(),
            dry_run: self.dry_run,
        })
    }

    /// Database path: `--database` wins over configuration.
    pub fn database_path(&self, config: &Config) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| config.database.path.clone())
    }
}
