use kuraz_core::AppError;
use kuraz_services::ClientError;
use kuraz_weather::WeatherError;
use thiserror::Error;

use crate::state::View;

/// Why a session operation didn't complete. None of these end the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Suggestions(#[from] ClientError),

    #[error("Cannot {operation} from the {from} view")]
    InvalidTransition {
        from: View,
        operation: &'static str,
    },

    #[error("{0} already in progress")]
    Busy(&'static str),

    /// The session moved on while the call was in flight
    #[error("Result discarded because the session moved on")]
    Superseded,

    #[error("Suggestions are not configured")]
    SuggestionsUnavailable,
}

impl SessionError {
    pub fn user_message(&self) -> &'static str {
        AppError::from(self).user_message()
    }

    /// Whether repeating the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Weather(e) => matches!(e, WeatherError::Unavailable(_)),
            SessionError::Suggestions(e) => e.is_retryable(),
            SessionError::Busy(_) | SessionError::Superseded => true,
            SessionError::InvalidTransition { .. } | SessionError::SuggestionsUnavailable => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_outage_is_retryable() {
        let err = SessionError::Weather(WeatherError::Unavailable("offline".into()));
        assert!(err.is_retryable());
        let err = SessionError::Weather(WeatherError::InvalidCoordinates("north".into()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn suggestion_errors_follow_client() {
        assert!(SessionError::Suggestions(ClientError::RetryExhausted { attempts: 5 }).is_retryable());
        let rejected = SessionError::Suggestions(ClientError::Server {
            status: 400,
            message: "API key not valid".into(),
        });
        assert!(!rejected.is_retryable());
        assert!(!SessionError::SuggestionsUnavailable.is_retryable());
    }
}
