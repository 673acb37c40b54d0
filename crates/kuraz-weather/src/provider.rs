//! Weather providers behind a single typed contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{
    ConditionCode, Coordinates, CurrentConditions, ForecastEntry, WeatherError, WeatherSnapshot,
};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const FORECAST_DAYS: usize = 6;

/// Anything that can turn resolved coordinates into a snapshot.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn lookup(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError>;
}

/// Returns a fixed record after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedWeatherSource {
    latency: Duration,
}

impl SimulatedWeatherSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn record(coordinates: Coordinates) -> WeatherSnapshot {
        let forecast = [
            ("Aug 5", 14.0, ConditionCode::FewClouds),
            ("Aug 6", 15.0, ConditionCode::Rain),
            ("Aug 7", 17.0, ConditionCode::Clear),
            ("Aug 8", 12.0, ConditionCode::Rain),
            ("Aug 9", 14.0, ConditionCode::FewClouds),
            ("Aug 10", 16.0, ConditionCode::FewClouds),
        ]
        .into_iter()
        .map(|(label, temperature_c, condition)| ForecastEntry {
            label: label.to_string(),
            temperature_c,
            condition,
        })
        .collect();

        WeatherSnapshot {
            location_label: "Addis Ababa, ET".to_string(),
            coordinates,
            current: CurrentConditions {
                temperature_c: 14.0,
                condition: ConditionCode::FewClouds,
                condition_label: ConditionCode::FewClouds.label().to_string(),
                wind_speed: 100.0,
            },
            forecast,
            fetched_at: Utc::now(),
        }
    }
}

impl Default for SimulatedWeatherSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl WeatherSource for SimulatedWeatherSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn lookup(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(Self::record(coordinates))
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<f64>,
    weather_code: Vec<i32>,
}

/// Live lookup against the Open-Meteo forecast API (no API key required).
#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    client: Client,
    base_url: String,
}

impl OpenMeteoSource {
    pub fn new(base_url: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_snapshot(
        coordinates: Coordinates,
        body: ForecastResponse,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let daily = body.daily;
        if daily.time.len() != daily.temperature_2m_max.len()
            || daily.time.len() != daily.weather_code.len()
        {
            return Err(WeatherError::Unavailable(
                "daily series have mismatched lengths".to_string(),
            ));
        }

        let forecast = daily
            .time
            .iter()
            .zip(daily.temperature_2m_max.iter())
            .zip(daily.weather_code.iter())
            .map(|((date, max), code)| ForecastEntry {
                label: date.format("%b %-d").to_string(),
                temperature_c: max.round(),
                condition: ConditionCode::from_wmo_code(*code),
            })
            .collect();

        let condition = ConditionCode::from_wmo_code(body.current.weather_code);

        Ok(WeatherSnapshot {
            location_label: coordinates.display_label(),
            coordinates,
            current: CurrentConditions {
                temperature_c: body.current.temperature_2m.round(),
                condition,
                condition_label: condition.label().to_string(),
                wind_speed: body.current.wind_speed_10m.max(0.0),
            },
            forecast,
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    fn name(&self) -> &str {
        "open-meteo"
    }

    #[instrument(skip(self), level = "info")]
    async fn lookup(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}\
             &current=temperature_2m,weather_code,wind_speed_10m\
             &daily=temperature_2m_max,weather_code&forecast_days={}&timezone=auto",
            self.base_url, coordinates.latitude, coordinates.longitude, FORECAST_DAYS
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WeatherError::Unavailable(format!("{}: {}", status, text)));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Unavailable(format!("unreadable forecast: {}", e)))?;

        Self::build_snapshot(coordinates, body)
    }
}
