//! GitHub REST API client.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{provider_error, read_response};
use crate::executor::ApiError;
use crate::provider::Provider;

pub const GITHUB_DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("outpost/", env!("CARGO_PKG_VERSION"));

/// GitHub remote operations used by the pipeline.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<Value, ApiError>;

    async fn list_issues(&self, owner: &str, repo: &str) -> Result<Value, ApiError>;
}

/// HTTP-backed GitHub client.
pub struct GithubHttp {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GithubHttp {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(GITHUB_DEFAULT_API_BASE_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            // GitHub rejects requests without a User-Agent.
            .header("user-agent", USER_AGENT)
    }

    async fn parse(&self, resp: reqwest::Response) -> Result<Value, ApiError> {
        let (status, headers, parsed, text) = read_response(resp).await?;
        if (200..300).contains(&status) {
            return Ok(parsed);
        }
        let message = parsed
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("github request failed")
            .to_string();
        Err(provider_error(
            Provider::Github,
            status,
            message,
            text,
            headers,
        ))
    }
}

#[async_trait]
impl GithubApi for GithubHttp {
    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut payload = json!({ "title": title });
        if let Some(body) = body {
            payload["body"] = json!(body);
        }
        let url = self.api_url(&format!("/repos/{owner}/{repo}/issues"));
        let resp = self
            .request(self.client.post(url))
            .json(&payload)
            .send()
            .await
            .map_err(ApiError::transport)?;
        self.parse(resp).await
    }

    async fn list_issues(&self, owner: &str, repo: &str) -> Result<Value, ApiError> {
        let url = self.api_url(&format!("/repos/{owner}/{repo}/issues"));
        let resp = self
            .request(self.client.get(url))
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
        let client = GithubHttp::with_base_url("http://localhost:9000/", "ghp_x");
        assert_eq!(
            client.api_url("/repos/acme/widgets/issues"),
            "http://localhost:9000/repos/acme/widgets/issues"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = GithubHttp::with_base_url("http://127.0.0.1:1", "ghp_x");
        let err = client.list_issues("acme", "widgets").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
