pub mod config;
pub mod error;

pub use config::{Config, SearchConfig, ValidationResult};
pub use error::{ConfigError, NetworkError, ReqwestErrorExt, SearchError};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Honors `RUST_LOG`, falling back to `info`. Safe to call more than once.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("Canavial core initialized");
    Ok(())
}
