//! Centralized error types for tracksync.
//!
//! `SyncError` is the complete failure taxonomy of a sync run. Every failure
//! is terminal for the run that raised it; nothing is retried internally.
//! `Display` carries the detailed message reported as the run's error text,
//! `user_message()` a short hint logged alongside it.

use thiserror::Error;

/// Failure of a single sync run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Board URL is malformed, not sprint-scoped, or names an unknown sprint.
    #[error("Invalid board reference: {0}")]
    InvalidBoardReference(String),

    #[error("Missing tracker credential: a non-empty token is required")]
    MissingCredential,

    /// Token rejected by the tracker (invalid, expired or lacking access).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Network failure or tracker-side error.
    #[error("Remote tracker unavailable: {0}")]
    RemoteUnavailable(String),

    /// A task could not be committed to the local store. Tasks created
    /// earlier in the same run stay committed.
    #[error("Failed to persist task: {0}")]
    PersistenceError(String),
}

impl SyncError {
    pub fn invalid_board(message: impl Into<String>) -> Self {
        Self::InvalidBoardReference(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteUnavailable(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceError(message.into())
    }

    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::InvalidBoardReference(_) => {
                "The board link must point to a specific sprint. Check the URL and try again."
            }
            SyncError::MissingCredential => "A YouTrack token is required.",
            SyncError::AuthenticationFailed(_) => {
                "YouTrack rejected the token. Check that it is valid and not expired."
            }
            SyncError::RemoteUnavailable(_) => {
                "YouTrack could not be reached. Please try again later."
            }
            SyncError::PersistenceError(_) => {
                "Some tasks could not be saved. Tasks created before the failure were kept."
            }
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_sync_error(self) -> SyncError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_sync_error(self) -> SyncError {
        if self.is_timeout() {
            SyncError::remote(format!("request timed out: {self}"))
        } else if self.is_connect() {
            SyncError::remote(format!("connection failed: {self}"))
        } else if self.is_builder() {
            SyncError::invalid_board(self.to_string())
        } else if let Some(status) = self.status() {
            SyncError::from_status(status.as_u16(), &self.to_string())
        } else if self.is_decode() {
            SyncError::remote(format!("invalid response: {self}"))
        } else {
            SyncError::remote(self.to_string())
        }
    }
}

impl SyncError {
    /// Classify a non-success HTTP status returned by the tracker.
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            401 | 403 => SyncError::AuthenticationFailed(format!("{status}: {message}")),
            404 => SyncError::InvalidBoardReference(format!(
                "board or sprint not found ({status}): {message}"
            )),
            _ => SyncError::RemoteUnavailable(format!("{status}: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            SyncError::from_status(401, "bad token"),
            SyncError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            SyncError::from_status(403, "forbidden"),
            SyncError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            SyncError::from_status(404, "no sprint"),
            SyncError::InvalidBoardReference(_)
        ));
        assert!(matches!(
            SyncError::from_status(503, "maintenance"),
            SyncError::RemoteUnavailable(_)
        ));
        assert!(matches!(
            SyncError::from_status(429, "slow down"),
            SyncError::RemoteUnavailable(_)
        ));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = SyncError::persistence("disk full");
        assert_eq!(err.to_string(), "Failed to persist task: disk full");
    }

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = [
            SyncError::invalid_board("x"),
            SyncError::MissingCredential,
            SyncError::AuthenticationFailed("x".into()),
            SyncError::remote("x"),
            SyncError::persistence("x"),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
