pub mod config;
pub mod error;

pub use config::{
    Config, Environment, FeatureFlags, MapsConfig, ValidationResult, WeatherConfig,
};
pub use error::{
    AppError, ConfigError, NetworkError, ReqwestErrorExt, StorageError, WeatherApiError,
};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Logs go to stderr; stdout is reserved for command output.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("SkyCast core initialized");
    Ok(())
}
