//! Sprint references and the board source seam.
//!
//! A YouTrack board link looks like
//! `https://host/youtrack/agiles/{agileId}/{sprintId}?settings`. Only links
//! that name a sprint can be synced.

use std::fmt;
use std::future::Future;

use tracksync_core::SyncError;
use url::Url;

use crate::issue::RemoteIssue;

/// Source of the issues on a board sprint.
///
/// `YouTrackClient` is the production implementation; tests inject fakes.
pub trait BoardSource {
    /// Fetch every issue of the referenced sprint, in the tracker's order.
    fn fetch_board_issues(
        &self,
        board: &BoardRef,
    ) -> impl Future<Output = Result<Vec<RemoteIssue>, SyncError>> + Send;
}

/// A parsed reference to one sprint of an agile board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRef {
    /// Tracker root, always ending in `/` (e.g. `https://host/youtrack/`)
    pub base_url: Url,
    pub agile_id: String,
    pub sprint_id: String,
}

impl BoardRef {
    /// Parse a full board URL.
    ///
    /// # Errors
    /// `InvalidBoardReference` if the URL is malformed or does not contain
    /// `/agiles/{agileId}/{sprintId}`.
    pub fn parse(board_url: &str) -> Result<Self, SyncError> {
        let url = parse_http_url(board_url)?;

        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();

        let agiles_index = segments
            .iter()
            .position(|s| s.eq_ignore_ascii_case("agiles"))
            .ok_or_else(|| {
                SyncError::invalid_board("board URL must contain '/agiles/{agileId}/{sprintId}'")
            })?;

        let agile_id = non_empty_segment(&segments, agiles_index + 1)
            .ok_or_else(|| SyncError::invalid_board("board URL is missing the agile id"))?;
        let sprint_id = non_empty_segment(&segments, agiles_index + 2).ok_or_else(|| {
            SyncError::invalid_board("board URL must reference a specific sprint")
        })?;

        let mut prefix_path = String::from("/");
        for segment in &segments[..agiles_index] {
            if !segment.is_empty() {
                prefix_path.push_str(segment);
                prefix_path.push('/');
            }
        }

        let mut base_url = url.clone();
        base_url.set_path(&prefix_path);
        base_url.set_query(None);
        base_url.set_fragment(None);

        Ok(Self {
            base_url,
            agile_id: agile_id.to_string(),
            sprint_id: sprint_id.to_string(),
        })
    }

    /// Build a reference from a tracker base URL and explicit ids.
    ///
    /// # Errors
    /// `InvalidBoardReference` if the base URL is malformed or an id is blank.
    pub fn from_parts(base_url: &str, agile_id: &str, sprint_id: &str) -> Result<Self, SyncError> {
        let mut base_url = parse_http_url(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);

        let agile_id = agile_id.trim();
        let sprint_id = sprint_id.trim();
        if agile_id.is_empty() {
            return Err(SyncError::invalid_board("agile id cannot be empty"));
        }
        if sprint_id.is_empty() {
            return Err(SyncError::invalid_board("sprint id cannot be empty"));
        }

        Ok(Self {
            base_url,
            agile_id: agile_id.to_string(),
            sprint_id: sprint_id.to_string(),
        })
    }

    /// REST endpoint listing the sprint's issues.
    ///
    /// # Errors
    /// `InvalidBoardReference` if the ids cannot form a valid URL path.
    pub fn sprint_issues_url(&self) -> Result<Url, SyncError> {
        self.base_url
            .join(&format!("api/agiles/{}/sprints/{}/issues", self.agile_id, self.sprint_id))
            .map_err(|e| SyncError::invalid_board(format!("failed to build sprint issues URL: {e}")))
    }

    /// Browser URL of an issue on this tracker.
    pub fn issue_url(&self, issue_id: &str) -> Option<Url> {
        self.base_url.join(&format!("issue/{issue_id}")).ok()
    }
}

impl fmt::Display for BoardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}agiles/{}/{}", self.base_url, self.agile_id, self.sprint_id)
    }
}

fn parse_http_url(raw: &str) -> Result<Url, SyncError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| SyncError::invalid_board(format!("invalid YouTrack URL '{raw}': {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SyncError::invalid_board(format!(
            "URL must use http or https scheme, got: {}",
            url.scheme()
        )));
    }
    if url.host().is_none() {
        return Err(SyncError::invalid_board("URL must have a host"));
    }

    Ok(url)
}

fn non_empty_segment<'a>(segments: &[&'a str], index: usize) -> Option<&'a str> {
    segments.get(index).copied().filter(|s| !s.is_empty())
}
