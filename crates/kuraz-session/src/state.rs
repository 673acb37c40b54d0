//! View state machine and the session record it guards.
//!
//! Each view admits exactly one forward operation; `return_to_welcome` is
//! allowed from anywhere.

use kuraz_services::Suggestion;
use kuraz_weather::{CoordinateInput, WeatherSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Welcome,
    Search,
    Results,
}

impl View {
    /// True if `start_search` is allowed.
    pub fn can_start_search(self) -> bool {
        matches!(self, View::Welcome)
    }

    /// True if `submit_coordinates` is allowed.
    pub fn can_submit_coordinates(self) -> bool {
        matches!(self, View::Search)
    }

    /// True if `request_suggestions` is allowed.
    pub fn can_request_suggestions(self) -> bool {
        matches!(self, View::Results)
    }

    pub fn name(self) -> &'static str {
        match self {
            View::Welcome => "welcome",
            View::Search => "search",
            View::Results => "results",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a rendering layer needs to draw the session.
///
/// `view == Results` implies `weather.is_some()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub view: View,
    pub coordinates: CoordinateInput,
    pub weather: Option<WeatherSnapshot>,
    pub suggestions: Vec<Suggestion>,
    pub weather_loading: bool,
    pub suggestions_loading: bool,
    /// User-facing message from the last failed operation
    pub error_message: Option<String>,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.weather_loading || self.suggestions_loading
    }
}
