//! Error vocabulary shared by every Kuraz crate.
//!
//! Each subsystem keeps its own error enum; the session layer folds them into
//! `AppError`, whose `user_message()` is what ends up on screen.

use thiserror::Error;

/// Anything that can go wrong in a session, grouped by where it came from.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Suggestion error: {0}")]
    Suggestion(#[from] SuggestionError),

    #[error("Session error: {0}")]
    Session(#[from] SessionFault),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short, non-technical text for the error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Suggestion(e) => e.user_message(),
            AppError::Session(e) => e.user_message(),
            AppError::Other(_) => "Something went wrong. Please try again.",
        }
    }
}

/// The request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Could not reach the service: {0}")]
    ConnectionFailed(String),

    #[error("Gave up waiting for a response")]
    Timeout,
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "You appear to be offline. Check your connection.",
            NetworkError::Timeout => "That took too long. Please try again.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config failed validation: {0}")]
    Invalid(String),

    #[error("Config file could not be parsed: {0}")]
    ParseError(String),

    #[error("Setting `{0}` is not set")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Some settings are out of range. Fix config.toml.",
            ConfigError::ParseError(_) => "config.toml isn't valid TOML.",
            ConfigError::MissingSetting(_) => "A setting Kuraz needs is missing.",
        }
    }
}

/// Weather lookup errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Weather unavailable: {0}")]
    Unavailable(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::InvalidCoordinates(_) => {
                "Those coordinates don't look right. Check latitude and longitude."
            }
            WeatherError::Unavailable(_) => "Weather is unavailable right now. Please try again.",
        }
    }
}

/// Activity suggestion errors.
#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Suggestion API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed suggestion response: {0}")]
    MalformedResponse(String),

    #[error("Suggestions are not configured")]
    NotConfigured,
}

impl SuggestionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SuggestionError::RateLimited { .. } => {
                "The suggestion service is busy. Please wait and try again."
            }
            SuggestionError::ApiError { status, .. } if *status >= 500 => {
                "The suggestion service is having issues. Please try again later."
            }
            SuggestionError::ApiError { .. } => "Couldn't get suggestions. Please try again.",
            SuggestionError::MalformedResponse(_) => {
                "Received unreadable suggestions. Please try again."
            }
            SuggestionError::NotConfigured => "Suggestions need an API key. Set GEMINI_API_KEY.",
        }
    }
}

/// Session operations invoked at the wrong time.
#[derive(Debug, Error)]
pub enum SessionFault {
    #[error("Cannot {operation} from the {from} view")]
    InvalidTransition { from: String, operation: String },

    #[error("{0} already in progress")]
    Busy(String),

    #[error("Result discarded because the session moved on")]
    Superseded,
}

impl SessionFault {
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionFault::InvalidTransition { .. } => "That action isn't available right now.",
            SessionFault::Busy(_) => "Still working on it. Please wait.",
            SessionFault::Superseded => "That request is no longer needed.",
        }
    }
}
