//! Linear GraphQL API client.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{provider_error, read_response};
use crate::executor::ApiError;
use crate::provider::Provider;

pub const LINEAR_DEFAULT_API_BASE_URL: &str = "https://api.linear.app/graphql";

const ISSUE_CREATE_MUTATION: &str = "\
mutation IssueCreate($teamId: String!, $title: String!, $description: String) {
  issueCreate(input: { teamId: $teamId, title: $title, description: $description }) {
    success
    issue { id identifier title url }
  }
}";

/// Linear remote operations used by the pipeline.
#[async_trait]
pub trait LinearApi: Send + Sync {
    async fn create_issue(
        &self,
        team_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Value, ApiError>;
}

/// HTTP-backed Linear client.
pub struct LinearHttp {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LinearHttp {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(LINEAR_DEFAULT_API_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Map a GraphQL response to `Ok(data)` or a provider error.
    ///
    /// GraphQL-level failures come back as HTTP 200 with an `errors` array;
    /// rate limiting is a real 429.
    async fn parse(&self, resp: reqwest::Response) -> Result<Value, ApiError> {
        let (status, headers, parsed, text) = read_response(resp).await?;

        if !(200..300).contains(&status) {
            let message = parsed
                .get("errors")
                .and_then(|e| e.get(0))
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("linear request failed")
                .to_string();
            return Err(provider_error(
                Provider::Linear,
                status,
                message,
                text,
                headers,
            ));
        }

        if let Some(errors) = parsed.get("errors").and_then(|v| v.as_array()) {
            let message = errors
                .first()
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("linear request failed")
                .to_string();
            return Err(provider_error(
                Provider::Linear,
                status,
                message,
                text,
                headers,
            ));
        }

        Ok(parsed.get("data").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl LinearApi for LinearHttp {
    async fn create_issue(
        &self,
        team_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Value, ApiError> {
        let body = json!({
            "query": ISSUE_CREATE_MUTATION,
            "variables": {
                "teamId": team_id,
                "title": title,
                "description": description,
            },
        });
        let resp = self
            .client
            .post(&self.base_url)
            // Linear expects the API key bare in the Authorization header.
            .header("authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::transport)?;
        self.parse(resp).await
    }
}
