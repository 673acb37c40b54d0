//! Activity suggestions generated by a schema-constrained LLM call.

use kuraz_weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::ClientError;
use crate::retry::{HttpRequest, RetryingHttpClient};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// One suggested activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Builds prompts from weather and turns model output into suggestions.
#[derive(Clone)]
pub struct SuggestionService {
    client: RetryingHttpClient,
    endpoint: String,
    model: String,
    api_key: String,
}

impl SuggestionService {
    pub fn with_endpoint(
        client: RetryingHttpClient,
        endpoint: &str,
        model: &str,
        api_key: &str,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Generate a fresh suggestion set for `weather`.
    ///
    /// `None` returns an empty set without touching the network.
    #[instrument(skip(self, weather), level = "info")]
    pub async fn generate(
        &self,
        weather: Option<&WeatherSnapshot>,
    ) -> Result<Vec<Suggestion>, ClientError> {
        let Some(weather) = weather else {
            tracing::debug!("No weather yet, skipping suggestion request");
            return Ok(Vec::new());
        };

        let request = self.build_request(weather)?;
        let body = self.client.send(&request).await?;
        let suggestions = parse_suggestions(body)?;

        tracing::info!("Received {} suggestions", suggestions.len());
        Ok(suggestions)
    }

    fn build_request(&self, weather: &WeatherSnapshot) -> Result<HttpRequest, ClientError> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(render_prompt(weather)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: suggestion_schema(),
            },
        };

        let body = serde_json::to_value(&payload)
            .map_err(|e| ClientError::MalformedResponse(format!("unencodable request: {}", e)))?;

        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        Ok(HttpRequest::post_json(url, body).header(API_KEY_HEADER, self.api_key.as_str()))
    }
}

impl std::fmt::Debug for SuggestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionService")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Prompt text for the current conditions
pub fn render_prompt(weather: &WeatherSnapshot) -> String {
    format!(
        "Based on the following weather conditions: a temperature of {}°C and a sky condition \
         of '{}', suggest 3-4 suitable activities. Provide each activity with a short title \
         and a one-sentence description.",
        weather.current.temperature_c,
        weather.current.condition_label.to_lowercase()
    )
}

/// Response schema: an array of `{title, description}` objects
fn suggestion_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "description": { "type": "STRING" }
            },
            "propertyOrdering": ["title", "description"]
        }
    })
}

/// The model's answer is JSON text nested inside the first candidate.
fn parse_suggestions(body: Value) -> Result<Vec<Suggestion>, ClientError> {
    let response: GenerateContentResponse = serde_json::from_value(body)
        .map_err(|e| ClientError::MalformedResponse(format!("unexpected envelope: {}", e)))?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| ClientError::MalformedResponse("no candidate text".to_string()))?;

    serde_json::from_str(&text)
        .map_err(|e| ClientError::MalformedResponse(format!("candidate text is not a suggestion list: {}", e)))
}
