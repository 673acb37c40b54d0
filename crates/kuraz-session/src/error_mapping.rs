//! Maps session-level errors into the application error hierarchy so the
//! UI gets one vocabulary of user messages.

use kuraz_core::{
    AppError, NetworkError, SessionFault, SuggestionError, WeatherError as CoreWeatherError,
};
use kuraz_services::ClientError;
use kuraz_weather::WeatherError;

use crate::error::SessionError;

fn weather_error(e: &WeatherError) -> AppError {
    match e {
        WeatherError::InvalidCoordinates(s) => {
            AppError::Weather(CoreWeatherError::InvalidCoordinates(s.clone()))
        }
        WeatherError::Unavailable(s) => AppError::Weather(CoreWeatherError::Unavailable(s.clone())),
    }
}

fn client_error(e: &ClientError) -> AppError {
    match e {
        ClientError::Transport(s) => AppError::Network(NetworkError::ConnectionFailed(s.clone())),
        ClientError::Timeout(_) => AppError::Network(NetworkError::Timeout),
        ClientError::RetryExhausted { attempts } => {
            AppError::Suggestion(SuggestionError::RateLimited {
                attempts: *attempts,
            })
        }
        ClientError::Server { status, message } => {
            AppError::Suggestion(SuggestionError::ApiError {
                status: *status,
                message: message.clone(),
            })
        }
        ClientError::MalformedResponse(s) => {
            AppError::Suggestion(SuggestionError::MalformedResponse(s.clone()))
        }
    }
}

impl From<&SessionError> for AppError {
    fn from(e: &SessionError) -> Self {
        match e {
            SessionError::Weather(e) => weather_error(e),
            SessionError::Suggestions(e) => client_error(e),
            SessionError::InvalidTransition { from, operation } => {
                AppError::Session(SessionFault::InvalidTransition {
                    from: from.to_string(),
                    operation: (*operation).to_string(),
                })
            }
            SessionError::Busy(what) => AppError::Session(SessionFault::Busy((*what).to_string())),
            SessionError::Superseded => AppError::Session(SessionFault::Superseded),
            SessionError::SuggestionsUnavailable => {
                AppError::Suggestion(SuggestionError::NotConfigured)
            }
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::from(&e)
    }
}
