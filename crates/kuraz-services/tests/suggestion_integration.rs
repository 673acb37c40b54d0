//! Integration tests for SuggestionService using wiremock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kuraz_services::{ClientError, RetryPolicy, RetryingHttpClient, Sleeper, SuggestionService};
use kuraz_weather::{SimulatedWeatherSource, WeatherSnapshot, WeatherSource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _: Duration) {}
}

fn service(server: &MockServer) -> SuggestionService {
    let client = RetryingHttpClient::new(RetryPolicy::default())
        .unwrap()
        .with_sleeper(Arc::new(NoSleep));
    SuggestionService::with_endpoint(client, &server.uri(), MODEL, "test-key")
}

async fn weather() -> WeatherSnapshot {
    SimulatedWeatherSource::new(Duration::ZERO)
        .lookup(kuraz_weather::Coordinates {
            latitude: 8.9806,
            longitude: 38.7578,
        })
        .await
        .unwrap()
}

/// Model response whose nested text is `text`
fn model_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn suggestions_text(titles: &[&str]) -> String {
    let items: Vec<serde_json::Value> = titles
        .iter()
        .map(|t| serde_json::json!({ "title": t, "description": format!("{} today.", t) }))
        .collect();
    serde_json::Value::Array(items).to_string()
}

#[tokio::test]
async fn test_no_weather_never_calls_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let suggestions = service(&mock_server).generate(None).await.unwrap();

    assert!(suggestions.is_empty());
    let received = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 0);
}

#[tokio::test]
async fn test_generate_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(model_response(&suggestions_text(&["Hike", "Museum", "Cafe"]))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let weather = weather().await;
    let suggestions = service(&mock_server).generate(Some(&weather)).await.unwrap();

    assert_eq!(suggestions.len(), 3);
    assert_eq!(suggestions[0].title, "Hike");
    assert_eq!(suggestions[2].description, "Cafe today.");
}

#[tokio::test]
async fn test_request_carries_prompt_and_schema() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_response("[]")))
        .mount(&mock_server)
        .await;

    let weather = weather().await;
    service(&mock_server).generate(Some(&weather)).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("14°C"));
    assert!(prompt.contains("'few clouds'"));
    assert_eq!(
        body["generationConfig"]["responseSchema"]["items"]["properties"]["title"]["type"],
        "STRING"
    );
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_response(&suggestions_text(&["Picnic"]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let weather = weather().await;
    let suggestions = service(&mock_server).generate(Some(&weather)).await.unwrap();
    assert_eq!(suggestions.len(), 1);
}

#[tokio::test]
async fn test_unparseable_model_text_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_response("Sure! Go hiking.")))
        .mount(&mock_server)
        .await;

    let weather = weather().await;
    let err = service(&mock_server)
        .generate(Some(&weather))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_empty_candidates_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })))
        .mount(&mock_server)
        .await;

    let weather = weather().await;
    let err = service(&mock_server)
        .generate(Some(&weather))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_bad_api_key_surfaces_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 400, "message": "API key not valid" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let weather = weather().await;
    let err = service(&mock_server)
        .generate(Some(&weather))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Server { status: 400, .. }));
    assert!(err.to_string().contains("API key not valid"));
}
