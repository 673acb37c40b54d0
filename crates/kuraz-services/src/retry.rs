//! Rate-limit aware HTTP client with exponential backoff.
//!
//! Only `429 Too Many Requests` is retried. Everything else surfaces
//! immediately:
//! - Transport failures (connection refused, reset, DNS)
//! - Any other non-2xx status
//!
//! Backoff sleeps go through the [`Sleeper`] trait so tests can observe the
//! delays without waiting for them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tracing::instrument;

use crate::error::ClientError;

/// Default retry configuration
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of rate-limited attempts; the transport is called at
    /// most this many times
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Factor applied to the delay after each retry
    pub multiplier: u32,
    /// Deadline for the whole logical request, backoff included
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64, multiplier: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            multiplier,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay before retry number `retry` (0-based): `initial * multiplier^retry`
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = u64::from(self.multiplier).saturating_pow(retry);
        let delay_ms = u64::try_from(self.initial_delay.as_millis())
            .unwrap_or(u64::MAX)
            .saturating_mul(factor);
        Duration::from_millis(delay_ms)
    }
}

/// What to do with a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Success, parse the body
    Accept,
    /// Rate limited, back off and try again
    Retry,
    /// Permanent failure for this call
    Fail,
}

pub fn classify_status(status: StatusCode) -> RetryDecision {
    if status.is_success() {
        RetryDecision::Accept
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        RetryDecision::Retry
    } else {
        RetryDecision::Fail
    }
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// One logical request.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// Header values may carry credentials.
impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// HTTP client that absorbs rate limiting. Each `send` is independent.
#[derive(Clone)]
pub struct RetryingHttpClient {
    client: Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingHttpClient {
    pub fn new(policy: RetryPolicy) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            policy,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the backoff sleeper
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Issue the request, backing off on 429 until it succeeds, fails
    /// permanently, runs out of attempts or exceeds the policy timeout.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url), level = "info")]
    pub async fn send(&self, request: &HttpRequest) -> Result<Value, ClientError> {
        match self.policy.timeout {
            Some(limit) => tokio::time::timeout(limit, self.send_with_backoff(request))
                .await
                .map_err(|_| {
                    tracing::warn!("Request exceeded {:?}, giving up", limit);
                    ClientError::Timeout(limit)
                })?,
            None => self.send_with_backoff(request).await,
        }
    }

    async fn send_with_backoff(&self, request: &HttpRequest) -> Result<Value, ClientError> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let response = self.execute(request).await.map_err(|e| {
                tracing::warn!("Transport failure on attempt {}: {}", attempts, e);
                ClientError::Transport(e.to_string())
            })?;
            let status = response.status();

            match classify_status(status) {
                RetryDecision::Accept => {
                    if attempts > 1 {
                        tracing::info!("Request succeeded after {} retries", attempts - 1);
                    }
                    return Self::parse_body(response).await;
                }
                RetryDecision::Retry => {
                    if attempts >= self.policy.max_retries {
                        tracing::error!("Still rate limited after {} attempts", attempts);
                        return Err(ClientError::RetryExhausted { attempts });
                    }

                    let delay = self.policy.delay_for_retry(attempts - 1);
                    tracing::warn!(
                        "Rate limited (429), retry {} of {} in {:?}",
                        attempts,
                        self.policy.max_retries - 1,
                        delay
                    );
                    self.sleeper.sleep(delay).await;
                }
                RetryDecision::Fail => {
                    let message = response.text().await.unwrap_or_default();
                    tracing::error!("Request failed with status {}", status);
                    return Err(ClientError::Server {
                        status: status.as_u16(),
                        message,
                    });
                }
            }
        }
    }

    async fn execute(&self, request: &HttpRequest) -> Result<Response, reqwest::Error> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder.send().await
    }

    async fn parse_body(response: Response) -> Result<Value, ClientError> {
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::MalformedResponse(format!("body is not JSON: {}", e)))
    }
}

impl std::fmt::Debug for RetryingHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingHttpClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.multiplier, 2);
        assert_eq!(policy.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_delay_calculation() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(8000));
    }

    #[test]
    fn test_delay_with_custom_multiplier() {
        let policy = RetryPolicy::new(4, 100, 3);
        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(900));
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(100, 1000, 2);
        assert_eq!(policy.delay_for_retry(90), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_classify_status_codes() {
        assert_eq!(classify_status(StatusCode::OK), RetryDecision::Accept);
        assert_eq!(classify_status(StatusCode::CREATED), RetryDecision::Accept);

        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), RetryDecision::Retry);

        // Nothing else is retried, including server errors
        assert_eq!(classify_status(StatusCode::INTERNAL_SERVER_ERROR), RetryDecision::Fail);
        assert_eq!(classify_status(StatusCode::SERVICE_UNAVAILABLE), RetryDecision::Fail);
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), RetryDecision::Fail);
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), RetryDecision::Fail);
        assert_eq!(classify_status(StatusCode::REQUEST_TIMEOUT), RetryDecision::Fail);
    }

    #[test]
    fn test_request_debug_hides_header_values() {
        let request = HttpRequest::get("https://example.com").header("x-goog-api-key", "secret");
        let debug = format!("{:?}", request);
        assert!(debug.contains("x-goog-api-key"));
        assert!(!debug.contains("secret"));
    }
}
