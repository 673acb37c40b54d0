//! HTTP plumbing for Kuraz: a rate-limit aware client and the activity
//! suggestion service built on it.

pub mod error;
pub mod retry;
pub mod suggestion;

pub use error::ClientError;
pub use retry::{HttpRequest, RetryPolicy, RetryingHttpClient, Sleeper, TokioSleeper};
pub use suggestion::{Suggestion, SuggestionService};
