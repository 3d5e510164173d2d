use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `TRACKSYNC__SYNC__CREATED_TITLES_CAP=5`.
pub const ENV_PREFIX: &str = "TRACKSYNC";

/// Page sizes above this draw a warning; YouTrack may serve fewer per page.
const LARGE_PAGE_SIZE: u32 = 500;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local task database
    pub database: DatabaseConfig,

    /// YouTrack client settings
    pub youtrack: YouTrackConfig,

    /// Reconciliation settings
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the SQLite task database
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tracksync")
            .join("tasks.db");
        Self { path }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTrackConfig {
    /// Custom field holding the issue state when a request does not name one
    pub default_state_field: String,

    /// State value treated as "open" when a request does not name one
    pub default_open_value: String,

    /// Issues requested per page (`$top`)
    pub page_size: u32,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for YouTrackConfig {
    fn default() -> Self {
        Self {
            default_state_field: "State".to_string(),
            default_open_value: "Open".to_string(),
            page_size: 100,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number of created titles reported back in a sync result
    pub created_titles_cap: usize,

    /// Create tasks titled `[<issue id>] <summary>` instead of the bare summary
    pub prefix_titles_with_issue_id: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            created_titles_cap: 3,
            prefix_titles_with_issue_id: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist.
    ///
    /// Environment overrides are applied on top of the file.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                tracing::warn!("Could not write default config to {}: {e:#}", config_path.display());
            }
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file plus environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());

        let config = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read config file")?
            .try_deserialize::<Config>()
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails; warnings are logged.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!("Configuration validation failed: {}", validation.error_summary());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.youtrack.default_state_field.trim().is_empty() {
            result.add_error("youtrack.default_state_field", "State field name cannot be empty");
        }
        if self.youtrack.default_open_value.trim().is_empty() {
            result.add_error("youtrack.default_open_value", "Open value cannot be empty");
        }

        if self.youtrack.page_size == 0 {
            result.add_error("youtrack.page_size", "Page size must be greater than 0");
        } else if self.youtrack.page_size > LARGE_PAGE_SIZE {
            result.add_warning(
                "youtrack.page_size",
                format!("Page size is unusually large (>{LARGE_PAGE_SIZE})"),
            );
        }

        if self.youtrack.request_timeout_secs == 0 {
            result.add_error(
                "youtrack.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.sync.created_titles_cap == 0 {
            result.add_warning(
                "sync.created_titles_cap",
                "Created titles will not be reported (cap is 0)",
            );
        }

        if self.database.path.as_os_str().is_empty() {
            result.add_error("database.path", "Database path cannot be empty");
        } else if self.database.path.is_dir() {
            result.add_error(
                "database.path",
                format!("Path is a directory: {}", self.database.path.display()),
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("tracksync");

        Ok(config_dir.join("config.toml"))
    }
}
