//! Wires a `SessionController` from loaded configuration.

use std::sync::Arc;
use std::time::Duration;

use kuraz_core::{AppError, Config, RetrySettings, WeatherProviderKind};
use kuraz_services::{RetryPolicy, RetryingHttpClient, SuggestionService};
use kuraz_weather::{
    DefaultCoordinates, OpenMeteoSource, SimulatedWeatherSource, WeatherService, WeatherSource,
};

use crate::controller::SessionController;
use crate::error::SessionError;

/// Translate file settings into a client policy. A zero timeout disables it.
pub fn retry_policy(settings: &RetrySettings) -> RetryPolicy {
    let timeout = (settings.timeout_secs > 0).then(|| Duration::from_secs(settings.timeout_secs));
    RetryPolicy::new(
        settings.max_retries,
        settings.initial_delay_ms,
        settings.backoff_multiplier,
    )
    .with_timeout(timeout)
}

/// Build the weather provider and, if an API key is available, the
/// suggestion service.
pub fn build_controller(config: &Config) -> Result<SessionController, AppError> {
    let weather = build_weather_service(config)?;
    let suggestions = build_suggestion_service(config)?;
    Ok(SessionController::new(weather, suggestions))
}

fn build_weather_service(config: &Config) -> Result<WeatherService, AppError> {
    let source: Arc<dyn WeatherSource> = match config.weather.provider {
        WeatherProviderKind::Simulated => Arc::new(SimulatedWeatherSource::new(
            Duration::from_millis(config.weather.simulated_latency_ms),
        )),
        WeatherProviderKind::OpenMeteo => Arc::new(
            OpenMeteoSource::new(&config.weather.api_url).map_err(SessionError::from)?,
        ),
    };
    tracing::info!("Weather provider: {}", source.name());

    let defaults = DefaultCoordinates {
        latitude: config.weather.default_latitude,
        longitude: config.weather.default_longitude,
    };
    Ok(WeatherService::new(source, defaults))
}

fn build_suggestion_service(config: &Config) -> Result<Option<SuggestionService>, AppError> {
    let api_key = match config.suggestions.api_key() {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!("Activity suggestions disabled: {}", e);
            return Ok(None);
        }
    };

    let client =
        RetryingHttpClient::new(retry_policy(&config.retry)).map_err(SessionError::from)?;
    Ok(Some(SuggestionService::with_endpoint(
        client,
        &config.suggestions.endpoint,
        &config.suggestions.model,
        &api_key,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_give_default_policy() {
        let policy = retry_policy(&RetrySettings::default());
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let settings = RetrySettings {
            timeout_secs: 0,
            ..RetrySettings::default()
        };
        assert!(retry_policy(&settings).timeout.is_none());
    }

    #[test]
    fn custom_backoff_is_carried() {
        let settings = RetrySettings {
            max_retries: 3,
            initial_delay_ms: 250,
            backoff_multiplier: 3,
            timeout_secs: 10,
        };
        let policy = retry_policy(&settings);
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(750));
        assert_eq!(policy.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn simulated_provider_builds_without_network() {
        let config = Config::default();
        let controller = build_controller(&config).unwrap();
        assert_eq!(controller.snapshot().view, crate::View::Welcome);
    }

    #[test]
    fn open_meteo_provider_builds() {
        let mut config = Config::default();
        config.weather.provider = WeatherProviderKind::OpenMeteo;
        assert!(build_controller(&config).is_ok());
    }
}
