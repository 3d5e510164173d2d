pub mod config;
pub mod error;

pub use config::{Config, DatabaseConfig, SyncConfig, ValidationResult, YouTrackConfig};
pub use error::{ReqwestErrorExt, SyncError};

use anyhow::Result;

/// Initialize logging.
///
/// Logs go to stderr so stdout stays free for command output.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::debug!("tracksync core initialized");
    Ok(())
}
