//! Provider API clients.
//!
//! One trait per provider, one async method per remote operation. Operation
//! executors take the trait object, so tests substitute scripted fakes and
//! the composition root constructs one HTTP-backed client per provider at
//! startup — no module-level singletons.

mod github;
mod linear;
mod slack;

pub use github::{GithubApi, GithubHttp, GITHUB_DEFAULT_API_BASE_URL};
pub use linear::{LinearApi, LinearHttp, LINEAR_DEFAULT_API_BASE_URL};
pub use slack::{SlackApi, SlackHttp, SLACK_DEFAULT_API_BASE_URL};

use reqwest::Response;
use serde_json::Value;

use crate::executor::ApiError;
use crate::provider::Provider;

/// Read a response into `(status, headers, parsed body)` without failing on
/// malformed bodies; providers occasionally return plain text on errors.
pub(crate) async fn read_response(
    resp: Response,
) -> Result<(u16, reqwest::header::HeaderMap, Value, String), ApiError> {
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let text = resp.text().await.map_err(ApiError::transport)?;
    let parsed: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
    Ok((status, headers, parsed, text))
}

/// Build the uniform provider error for a non-success response.
pub(crate) fn provider_error(
    provider: Provider,
    status: u16,
    message: impl Into<String>,
    body: String,
    headers: reqwest::header::HeaderMap,
) -> ApiError {
    ApiError::Provider {
        provider,
        status,
        message: message.into(),
        body,
        headers,
    }
}
