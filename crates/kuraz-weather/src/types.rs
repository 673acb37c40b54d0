use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sky condition categories shown by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCode {
    #[default]
    Clear,
    FewClouds,
    Cloudy,
    Rain,
    Snow,
}

impl ConditionCode {
    /// Convert WMO weather code to ConditionCode
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 | 2 => Self::FewClouds,
            3 | 45 | 48 => Self::Cloudy,
            51..=67 | 80..=82 | 95..=99 => Self::Rain,
            71..=77 | 85 | 86 => Self::Snow,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Upper-case label used when the provider doesn't supply one
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "CLEAR",
            Self::FewClouds => "FEW CLOUDS",
            Self::Cloudy => "CLOUDY",
            Self::Rain => "RAIN",
            Self::Snow => "SNOW",
        }
    }
}

/// Resolved geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Short display form, e.g. `8.98, 38.76`
    pub fn display_label(&self) -> String {
        format!("{:.2}, {:.2}", self.latitude, self.longitude)
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub condition: ConditionCode,
    pub condition_label: String,
    /// Never negative
    pub wind_speed: f64,
}

/// One forecast slot; position in the forecast is chronological
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub label: String,
    pub temperature_c: f64,
    pub condition: ConditionCode,
}

/// Complete weather result. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_label: String,
    pub coordinates: Coordinates,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastEntry>,
    pub fetched_at: DateTime<Utc>,
}

/// Weather lookup errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Weather unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Unavailable(e.to_string())
    }
}
