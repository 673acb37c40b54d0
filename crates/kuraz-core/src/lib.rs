pub mod config;
pub mod error;

pub use config::{
    Config, RetrySettings, SuggestionsConfig, ValidationResult, WeatherConfig, WeatherProviderKind,
};
pub use error::{AppError, ConfigError, NetworkError, SessionFault, SuggestionError, WeatherError};

use anyhow::Result;

/// Initialize logging for the application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Kuraz core initialized");
    Ok(())
}
