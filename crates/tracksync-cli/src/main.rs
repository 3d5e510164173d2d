//! Binary entrypoint for the `tracksync` CLI.

mod cli;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracksync_core::Config;
use tracksync_services::{
    run_sync, ClientSettings, RunState, SyncOptions, SyncResult, TaskRepository,
};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = tracksync_core::init() {
        eprintln!("{e:#}");
    }

    match run(&cli).await {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to encode sync result: {e}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<SyncResult> {
    let (config, _) = Config::load_validated(cli.config.as_deref())?;
    let request = cli.sync_request(&config)?;

    let database = cli.database_path(&config);
    let tasks = TaskRepository::open_sqlite(&database)
        .with_context(|| format!("Failed to open task database {}", database.display()))?;
    tracing::debug!("Using task database {}", database.display());

    let settings = ClientSettings::from(&config.youtrack);
    let options = SyncOptions::from(&config.sync);

    let state = RunState::default().on_start();
    let outcome = run_sync(&request, &tasks, &settings, &options).await;
    if let Err(e) = &outcome {
        tracing::error!("Sync failed: {}", e.user_message());
    }
    let state = state.on_finished(outcome);

    if let Some(message) = state.error_message() {
        bail!("{message}");
    }
    state.result().cloned().context("sync finished without a result")
}
