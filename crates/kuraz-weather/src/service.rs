//! Weather lookups with default coordinates and snapshot validation.

use std::sync::Arc;

use tracing::instrument;

use crate::location::{CoordinateInput, DefaultCoordinates};
use crate::provider::WeatherSource;
use crate::types::{WeatherError, WeatherSnapshot};

/// Number of forecast entries every snapshot carries
pub const FORECAST_LEN: usize = 6;

#[derive(Clone)]
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    defaults: DefaultCoordinates,
}

impl WeatherService {
    pub fn new(source: Arc<dyn WeatherSource>, defaults: DefaultCoordinates) -> Self {
        Self { source, defaults }
    }

    /// Resolve a snapshot for the (possibly partial) input.
    ///
    /// Every failure is reported as `WeatherError::Unavailable`; a snapshot
    /// that doesn't carry exactly `FORECAST_LEN` entries is treated as a
    /// failure rather than returned partially.
    #[instrument(skip(self), fields(source = self.source.name()), level = "info")]
    pub async fn fetch(&self, input: &CoordinateInput) -> Result<WeatherSnapshot, WeatherError> {
        let coordinates = input.resolve(&self.defaults);
        tracing::debug!(
            "Resolved coordinates {}, {}",
            coordinates.latitude,
            coordinates.longitude
        );

        let snapshot = self.source.lookup(coordinates).await.map_err(|e| {
            tracing::warn!("Weather lookup failed: {}", e);
            match e {
                WeatherError::Unavailable(msg) => WeatherError::Unavailable(msg),
                other => WeatherError::Unavailable(other.to_string()),
            }
        })?;

        if snapshot.forecast.len() != FORECAST_LEN {
            tracing::warn!(
                "Provider returned {} forecast entries, expected {}",
                snapshot.forecast.len(),
                FORECAST_LEN
            );
            return Err(WeatherError::Unavailable(format!(
                "expected {} forecast entries, got {}",
                FORECAST_LEN,
                snapshot.forecast.len()
            )));
        }

        tracing::info!("Weather fetched for {}", snapshot.location_label);
        Ok(snapshot)
    }
}

impl std::fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherService")
            .field("source", &self.source.name())
            .field("defaults", &self.defaults)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::provider::SimulatedWeatherSource;
    use crate::types::Coordinates;

    struct FailingSource;

    #[async_trait]
    impl WeatherSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn lookup(&self, _: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
            Err(WeatherError::InvalidCoordinates("provider rejected".into()))
        }
    }

    struct ShortForecastSource;

    #[async_trait]
    impl WeatherSource for ShortForecastSource {
        fn name(&self) -> &str {
            "short"
        }

        async fn lookup(&self, c: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
            let mut snapshot = SimulatedWeatherSource::new(Duration::ZERO).lookup(c).await?;
            snapshot.forecast.truncate(3);
            Ok(snapshot)
        }
    }

    fn simulated() -> WeatherService {
        WeatherService::new(
            Arc::new(SimulatedWeatherSource::new(Duration::ZERO)),
            DefaultCoordinates::default(),
        )
    }

    #[tokio::test]
    async fn test_fetch_uses_defaults_for_empty_input() {
        let snapshot = simulated().fetch(&CoordinateInput::default()).await.unwrap();
        assert_eq!(snapshot.coordinates.latitude, 8.9806);
        assert_eq!(snapshot.coordinates.longitude, 38.7578);
    }

    #[tokio::test]
    async fn test_fetch_keeps_given_axis() {
        let input = CoordinateInput::new(None, Some(-1.5));
        let snapshot = simulated().fetch(&input).await.unwrap();
        assert_eq!(snapshot.coordinates.latitude, 8.9806);
        assert_eq!(snapshot.coordinates.longitude, -1.5);
    }

    #[tokio::test]
    async fn test_any_source_failure_is_unavailable() {
        let service = WeatherService::new(Arc::new(FailingSource), DefaultCoordinates::default());
        let err = service.fetch(&CoordinateInput::default()).await.unwrap_err();
        assert!(matches!(err, WeatherError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_short_forecast_is_rejected() {
        let service =
            WeatherService::new(Arc::new(ShortForecastSource), DefaultCoordinates::default());
        let err = service.fetch(&CoordinateInput::default()).await.unwrap_err();
        assert!(err.to_string().contains("expected 6"));
    }
}
