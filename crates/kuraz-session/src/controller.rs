//! The single owner of session state.
//!
//! All reads and writes go through `SessionController`. State lives behind a
//! mutex that is never held across an `.await`; each in-flight call carries
//! a generation number and its result is dropped if the session moved on in
//! the meantime.

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::instrument;

use kuraz_services::SuggestionService;
use kuraz_weather::{CoordinateInput, WeatherService};

use crate::error::SessionError;
use crate::state::{SessionState, View};

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    weather_generation: u64,
    suggestions_generation: u64,
}

impl Inner {
    fn fail(&mut self, error: SessionError) -> SessionError {
        self.state.error_message = Some(error.user_message().to_string());
        error
    }
}

pub struct SessionController {
    inner: Mutex<Inner>,
    updates: watch::Sender<SessionState>,
    weather: WeatherService,
    suggestions: Option<SuggestionService>,
}

impl SessionController {
    /// Start a session in the Welcome view.
    ///
    /// Without a `SuggestionService`, `request_suggestions` always reports
    /// `SessionError::SuggestionsUnavailable`.
    pub fn new(weather: WeatherService, suggestions: Option<SuggestionService>) -> Self {
        let (updates, _) = watch::channel(SessionState::default());
        Self {
            inner: Mutex::new(Inner::default()),
            updates,
            weather,
            suggestions,
        }
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// Receive a copy of the state after every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.suggestions.is_some()
    }

    /// Welcome → Search.
    pub fn start_search(&self) -> Result<(), SessionError> {
        self.update(|inner| {
            let view = inner.state.view;
            if !view.can_start_search() {
                return Err(SessionError::InvalidTransition {
                    from: view,
                    operation: "start search",
                });
            }

            inner.state.view = View::Search;
            inner.state.error_message = None;
            tracing::info!("Session view: welcome -> search");
            Ok(())
        })
    }

    /// Parse the search form fields, then submit them.
    pub async fn submit_coordinate_text(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<(), SessionError> {
        match CoordinateInput::from_text(latitude, longitude) {
            Ok(input) => self.submit_coordinates(input).await,
            Err(e) => self.update(|inner| {
                let view = inner.state.view;
                if !view.can_submit_coordinates() {
                    return Err(SessionError::InvalidTransition {
                        from: view,
                        operation: "submit coordinates",
                    });
                }
                tracing::warn!("Rejected coordinate input: {}", e);
                Err(inner.fail(SessionError::Weather(e)))
            }),
        }
    }

    /// Search → Results once the weather fetch succeeds.
    ///
    /// Rejected with `Busy` while a previous fetch is still running. On
    /// failure the session stays in Search with no weather.
    #[instrument(skip(self), level = "info")]
    pub async fn submit_coordinates(&self, input: CoordinateInput) -> Result<(), SessionError> {
        let generation = self.update(|inner| {
            let view = inner.state.view;
            if !view.can_submit_coordinates() {
                return Err(SessionError::InvalidTransition {
                    from: view,
                    operation: "submit coordinates",
                });
            }
            if inner.state.weather_loading {
                tracing::debug!("Weather fetch already running, rejecting submit");
                return Err(SessionError::Busy("weather fetch"));
            }

            inner.weather_generation += 1;
            // Suggestions for the old weather are meaningless now
            inner.suggestions_generation += 1;

            inner.state.coordinates = input;
            inner.state.weather = None;
            inner.state.suggestions.clear();
            inner.state.suggestions_loading = false;
            inner.state.weather_loading = true;
            inner.state.error_message = None;
            Ok(inner.weather_generation)
        })?;

        let result = self.weather.fetch(&input).await;

        self.update(|inner| {
            if inner.weather_generation != generation {
                tracing::debug!("Discarding stale weather result (generation {})", generation);
                return Err(SessionError::Superseded);
            }

            inner.state.weather_loading = false;
            match result {
                Ok(snapshot) => {
                    inner.state.weather = Some(snapshot);
                    inner.state.view = View::Results;
                    tracing::info!("Session view: search -> results");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("Weather fetch failed, staying on search: {}", e);
                    Err(inner.fail(SessionError::Weather(e)))
                }
            }
        })
    }

    /// Replace the suggestion list for the current weather.
    ///
    /// On failure the previous suggestions are kept.
    #[instrument(skip(self), level = "info")]
    pub async fn request_suggestions(&self) -> Result<(), SessionError> {
        let (generation, weather) = self.update(|inner| {
            let view = inner.state.view;
            let weather = match (&inner.state.weather, view.can_request_suggestions()) {
                (Some(weather), true) => weather.clone(),
                _ => {
                    return Err(SessionError::InvalidTransition {
                        from: view,
                        operation: "request suggestions",
                    })
                }
            };
            if self.suggestions.is_none() {
                return Err(inner.fail(SessionError::SuggestionsUnavailable));
            }
            if inner.state.suggestions_loading {
                tracing::debug!("Suggestion request already running, rejecting");
                return Err(SessionError::Busy("suggestion request"));
            }

            inner.suggestions_generation += 1;
            inner.state.suggestions_loading = true;
            inner.state.error_message = None;
            Ok((inner.suggestions_generation, weather))
        })?;

        let result = match &self.suggestions {
            Some(service) => service.generate(Some(&weather)).await,
            None => return Err(SessionError::SuggestionsUnavailable),
        };

        self.update(|inner| {
            if inner.suggestions_generation != generation {
                tracing::debug!(
                    "Discarding stale suggestions (generation {})",
                    generation
                );
                return Err(SessionError::Superseded);
            }

            inner.state.suggestions_loading = false;
            match result {
                Ok(suggestions) => {
                    tracing::info!("Showing {} suggestions", suggestions.len());
                    inner.state.suggestions = suggestions;
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("Suggestion request failed, keeping previous list: {}", e);
                    Err(inner.fail(SessionError::Suggestions(e)))
                }
            }
        })
    }

    /// Back to Welcome from anywhere.
    ///
    /// Clears suggestions, keeps the last weather snapshot, and invalidates
    /// any call still in flight.
    pub fn return_to_welcome(&self) {
        self.update(|inner| {
            inner.weather_generation += 1;
            inner.suggestions_generation += 1;

            let from = inner.state.view;
            inner.state.view = View::Welcome;
            inner.state.suggestions.clear();
            inner.state.weather_loading = false;
            inner.state.suggestions_loading = false;
            inner.state.error_message = None;
            tracing::info!("Session view: {} -> welcome", from);
        });
    }

    fn update<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock();
        let out = f(&mut inner);
        // Rejected operations leave state alone; don't wake subscribers
        self.updates.send_if_modified(|published| {
            if *published == inner.state {
                return false;
            }
            *published = inner.state.clone();
            true
        });
        out
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("view", &self.inner.lock().state.view)
            .field("weather", &self.weather)
            .field("suggestions_enabled", &self.suggestions.is_some())
            .finish()
    }
}
