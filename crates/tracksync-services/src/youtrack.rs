// crates/tracksync-services/src/youtrack.rs

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use serde::Deserialize;
use tracing::instrument;
use tracksync_core::{ReqwestErrorExt, SyncError, YouTrackConfig};

use crate::board::{BoardRef, BoardSource};
use crate::issue::{IssueField, RemoteIssue};

/// Fields requested for each sprint issue.
const ISSUE_FIELDS: &str = "idReadable,summary,description,customFields(name,value(name))";

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP settings for the YouTrack client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Issues per page (`$top`)
    pub page_size: u32,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl From<&YouTrackConfig> for ClientSettings {
    fn from(config: &YouTrackConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Issue as returned by the agile sprint endpoint
#[derive(Debug, Deserialize)]
struct ApiIssue {
    #[serde(rename = "idReadable")]
    id_readable: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "customFields", default)]
    custom_fields: Vec<ApiCustomField>,
}

#[derive(Debug, Deserialize)]
struct ApiCustomField {
    name: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

impl ApiIssue {
    fn into_remote(self, board: &BoardRef) -> RemoteIssue {
        let url = board.issue_url(&self.id_readable).map(|u| u.to_string());
        RemoteIssue {
            fields: self
                .custom_fields
                .into_iter()
                .map(|f| IssueField {
                    value: f.value.as_ref().and_then(field_value_text),
                    name: f.name,
                })
                .collect(),
            title: self.summary.unwrap_or_default(),
            description: self.description,
            id: self.id_readable,
            url,
        }
    }
}

/// Flatten a custom field value to text.
///
/// State and enum values arrive as `{"name": "Open"}`, simple fields as plain
/// JSON scalars, multi-value fields as arrays (first entry wins).
fn field_value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => map.get("name").and_then(|v| v.as_str()).map(str::to_string),
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Array(items) => items.iter().find_map(field_value_text),
        serde_json::Value::Null => None,
    }
}

/// YouTrack REST client, authenticated with a permanent token
#[derive(Debug, Clone)]
pub struct YouTrackClient {
    client: Arc<Client>,
    page_size: u32,
}

impl YouTrackClient {
    /// Create a client that sends `Authorization: Bearer <token>` on every request.
    ///
    /// # Errors
    /// `MissingCredential` for a blank token, `AuthenticationFailed` if the
    /// token cannot be sent as a header.
    pub fn new(token: &str, settings: &ClientSettings) -> Result<Self, SyncError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SyncError::MissingCredential);
        }

        let mut auth_value = header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| {
                SyncError::AuthenticationFailed(
                    "token contains characters not allowed in an HTTP header".to_string(),
                )
            })?;
        auth_value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent("tracksync")
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SyncError::remote(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            page_size: settings.page_size.max(1),
        })
    }

    /// Fetch all issues of a sprint, following `$skip`/`$top` pagination
    /// until an empty page.
    #[instrument(skip(self, board), fields(board = %board), level = "info")]
    pub async fn fetch_sprint_issues(&self, board: &BoardRef) -> Result<Vec<RemoteIssue>, SyncError> {
        let url = board.sprint_issues_url()?;
        let mut all = Vec::new();
        let mut skip: u32 = 0;

        loop {
            tracing::debug!("Fetching sprint issues, $skip={} $top={}", skip, self.page_size);

            let response = self
                .client
                .get(url.clone())
                .query(&[
                    ("$skip", skip.to_string()),
                    ("$top", self.page_size.to_string()),
                    ("fields", ISSUE_FIELDS.to_string()),
                ])
                .send()
                .await
                .map_err(ReqwestErrorExt::into_sync_error)?;

            let page: Vec<ApiIssue> = self.handle_response(response).await?;
            if page.is_empty() {
                break;
            }

            // The server may return fewer than `$top` even mid-sprint.
            skip = skip.saturating_add(u32::try_from(page.len()).unwrap_or(u32::MAX));
            all.extend(page.into_iter().map(|issue| issue.into_remote(board)));
        }

        tracing::info!("Fetched {} issues from sprint {}", all.len(), board.sprint_id);
        Ok(all)
    }

    /// Decode a successful response or classify the failure status.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| SyncError::remote(format!("failed to decode YouTrack issues JSON: {e}")));
        }

        let text = response.text().await.unwrap_or_default();
        tracing::warn!("YouTrack returned {}: {}", status, text);
        Err(SyncError::from_status(status.as_u16(), &text))
    }
}

impl BoardSource for YouTrackClient {
    fn fetch_board_issues(
        &self,
        board: &BoardRef,
    ) -> impl std::future::Future<Output = Result<Vec<RemoteIssue>, SyncError>> + Send {
        self.fetch_sprint_issues(board)
    }
}
