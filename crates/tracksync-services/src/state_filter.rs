//! Selection of "open" issues by a configurable state field.

use crate::issue::RemoteIssue;

/// True when the issue's `state_field` value equals `open_value` exactly.
///
/// The value comparison is case-sensitive; an issue without the field is
/// never open.
pub fn is_open_issue(issue: &RemoteIssue, state_field: &str, open_value: &str) -> bool {
    issue.field_value(state_field) == Some(open_value)
}

/// Keep the open issues, preserving the board's order.
pub fn filter_open(issues: Vec<RemoteIssue>, state_field: &str, open_value: &str) -> Vec<RemoteIssue> {
    let total = issues.len();
    let open: Vec<RemoteIssue> = issues
        .into_iter()
        .filter(|issue| is_open_issue(issue, state_field, open_value))
        .collect();

    tracing::debug!(
        "{} of {} issues have {} = {:?}",
        open.len(),
        total,
        state_field,
        open_value
    );
    open
}
