//! Slack Web API client.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{provider_error, read_response};
use crate::executor::ApiError;
use crate::provider::Provider;

pub const SLACK_DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Slack remote operations used by the pipeline.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn list_channels(&self) -> Result<Value, ApiError>;
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<Value, ApiError>;
}

/// HTTP-backed Slack client.
pub struct SlackHttp {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackHttp {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(SLACK_DEFAULT_API_BASE_URL, token)
    }

    /// Target an alternate Bot API base URL (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), method)
    }

    /// Map a Slack response to `Ok(body)` or a provider error.
    ///
    /// Slack reports most failures as HTTP 200 with `ok: false` and an error
    /// code; rate limiting arrives as a real 429.
    async fn parse(&self, resp: reqwest::Response) -> Result<Value, ApiError> {
        let (status, headers, parsed, text) = read_response(resp).await?;

        let ok = parsed
            .get("ok")
            .and_then(|v| v.as_bool())
            .unwrap_or((200..300).contains(&status));
        if ok {
            return Ok(parsed);
        }

        let message = parsed
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("slack request failed")
            .to_string();
        Err(provider_error(
            Provider::Slack,
            status,
            message,
            text,
            headers,
        ))
    }
}

#[async_trait]
impl SlackApi for SlackHttp {
    async fn list_channels(&self) -> Result<Value, ApiError> {
        let resp = self
            .client
            .get(self.api_url("conversations.list"))
            .bearer_auth(&self.token)
            .query(&[("types", "public_channel,private_channel")])
            .send()
            .await
            .map_err(ApiError::transport)?;
        self.parse(resp).await
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<Value, ApiError> {
        let body = json!({
            "channel": channel_id,
            "text": text,
        });
        let resp = self
            .client
            .post(self.api_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::transport)?;
        self.parse(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = SlackHttp::with_base_url("http://localhost:8080/", "xoxb-1");
        assert_eq!(
            client.api_url("chat.postMessage"),
            "http://localhost:8080/chat.postMessage"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = SlackHttp::with_base_url("http://127.0.0.1:1", "xoxb-1");
        let err = client.post_message("C1", "hi").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
