// crates/tracksync-services/src/issue.rs

use serde::{Deserialize, Serialize};

/// A custom field of a remote issue, value flattened to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueField {
    pub name: String,
    pub value: Option<String>,
}

impl IssueField {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
        }
    }
}

/// Read-only snapshot of an issue on the remote board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    /// Readable id, unique on the tracker (e.g. `PRJ-42`)
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<IssueField>,
    /// Browser URL of the issue
    pub url: Option<String>,
}

impl RemoteIssue {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields: Vec::new(),
            url: None,
        }
    }

    /// Builder-style helper to attach a field.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.push(IssueField::new(name, Some(value)));
        self
    }

    /// Value of the named custom field.
    ///
    /// Field names are matched ASCII case-insensitively, the same way the
    /// tracker resolves them. Returns `None` for a missing or empty field.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .and_then(|f| f.value.as_deref())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_field_value_lookup() {
        let issue = RemoteIssue::new("PRJ-1", "Fix login").with_field("State", "Open");
        assert_eq!(issue.field_value("State"), Some("Open"));
        assert_eq!(issue.field_value("state"), Some("Open"));
        assert_eq!(issue.field_value("Priority"), None);
    }

    #[test]
    fn test_field_without_value() {
        let mut issue = RemoteIssue::new("PRJ-2", "Empty state");
        issue.fields.push(IssueField::new("State", None));
        issue.fields.push(IssueField::new("Stage", Some("")));
        assert_eq!(issue.field_value("State"), None);
        assert_eq!(issue.field_value("Stage"), None);
    }
}
