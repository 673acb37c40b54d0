//! User-entered coordinates and per-axis fallbacks.

use serde::{Deserialize, Serialize};

use crate::types::{Coordinates, WeatherError};

/// Coordinates as typed into the search form. Either axis may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CoordinateInput {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse the two text fields. Blank text means "use the default".
    pub fn from_text(latitude: &str, longitude: &str) -> Result<Self, WeatherError> {
        Ok(Self {
            latitude: parse_axis(latitude, "latitude", 90.0)?,
            longitude: parse_axis(longitude, "longitude", 180.0)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none()
    }

    /// Fill missing axes from `defaults`.
    pub fn resolve(&self, defaults: &DefaultCoordinates) -> Coordinates {
        Coordinates {
            latitude: self.latitude.unwrap_or(defaults.latitude),
            longitude: self.longitude.unwrap_or(defaults.longitude),
        }
    }
}

fn parse_axis(text: &str, axis: &str, limit: f64) -> Result<Option<f64>, WeatherError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: f64 = trimmed.parse().map_err(|_| {
        WeatherError::InvalidCoordinates(format!("{} '{}' is not a number", axis, trimmed))
    })?;

    if !value.is_finite() || value.abs() > limit {
        return Err(WeatherError::InvalidCoordinates(format!(
            "{} {} is outside -{}..{}",
            axis, value, limit, limit
        )));
    }

    Ok(Some(value))
}

/// Canonical fallback location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for DefaultCoordinates {
    // Addis Ababa
    fn default() -> Self {
        Self {
            latitude: 8.9806,
            longitude: 38.7578,
        }
    }
}
