//! Sync run state machine.
//!
//! Ensures only one run is in flight per holder and that a failed run never
//! carries a partial result.

use tracksync_core::SyncError;

use crate::sync::SyncResult;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Done(SyncResult),
    Error(String),
}

impl RunState {
    /// True if a new run can be started.
    pub fn can_start(&self) -> bool {
        !matches!(self, RunState::Running)
    }

    /// State after a start request. A running state stays running.
    pub fn on_start(self) -> Self {
        RunState::Running
    }

    /// State after the run's outcome arrives.
    pub fn on_finished(self, outcome: Result<SyncResult, SyncError>) -> Self {
        match outcome {
            Ok(result) => RunState::Done(result),
            Err(e) => RunState::Error(e.to_string()),
        }
    }

    pub fn result(&self) -> Option<&SyncResult> {
        match self {
            RunState::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RunState::Error(message) => Some(message),
            _ => None,
        }
    }
}
