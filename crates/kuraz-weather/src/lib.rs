//! Weather lookup for Kuraz
//!
//! Resolves a weather snapshot for user-entered coordinates through a
//! pluggable provider: a simulated fixed record or the Open-Meteo API.

pub mod location;
pub mod provider;
pub mod service;
pub mod types;

pub use location::{CoordinateInput, DefaultCoordinates};
pub use provider::{OpenMeteoSource, SimulatedWeatherSource, WeatherSource};
pub use service::{WeatherService, FORECAST_LEN};
pub use types::*;
