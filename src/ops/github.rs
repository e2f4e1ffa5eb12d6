//! GitHub operations: create issue, list issues.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::GithubApi;
use crate::config::ProviderConfig;
use crate::credentials::validate_credentials;
use crate::envelope::Envelope;
use crate::executor::{with_rate_limit_retry, OperationContext};
use crate::provider::Provider;
use crate::storage::run_write_through;

/// A GitHub issue, trimmed to the fields the pipeline exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: String,
}

impl Issue {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            number: value.get("number")?.as_u64()?,
            title: value
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            state: value
                .get("state")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            url: value
                .get("html_url")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Resolve a repository alias or `owner/repo` path into its two halves.
fn resolve_repo(config: &ProviderConfig, name: &str) -> Result<(String, String), String> {
    let full = match config.resolve_alias(name) {
        Some(full) => full,
        None if name.contains('/') => name,
        None => {
            return Err(format!(
                "repository '{name}' not found, available options: {}",
                config.alias_names().join(", ")
            ))
        }
    };
    match full.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(format!("invalid repository '{full}': expected owner/repo")),
    }
}

/// Open an issue in a repository (by alias or `owner/repo`).
pub async fn create_issue(
    ctx: &OperationContext<'_>,
    client: &dyn GithubApi,
    repo: &str,
    title: &str,
    body: Option<&str>,
) -> Envelope<Issue> {
    let check = validate_credentials(ctx.config, &["token"], Provider::Github);
    if let Some(error) = check.error {
        return Envelope::fail(error);
    }

    let (owner, repo_name) = match resolve_repo(ctx.config, repo) {
        Ok(parts) => parts,
        Err(error) => return Envelope::fail(error),
    };

    let policy = ctx.policies.policy(Provider::Github);
    let raw = match with_rate_limit_retry(Provider::Github, policy, &ctx.cancel, || {
        client.create_issue(&owner, &repo_name, title, body)
    })
    .await
    {
        Ok(raw) => raw,
        Err(err) => return Envelope::fail(err),
    };

    let Some(issue) = Issue::from_value(&raw) else {
        return Envelope::fail("github returned an unrecognized issue payload");
    };

    run_write_through(ctx.storage, "github_issues", || {
        json!({
            "owner": owner,
            "repo": repo_name,
            "number": issue.number,
            "title": issue.title,
            "state": issue.state,
            "url": issue.url,
            "caller": ctx.caller,
        })
    })
    .await;

    Envelope::ok(issue)
}

/// List open issues in a repository (by alias or `owner/repo`).
pub async fn list_issues(
    ctx: &OperationContext<'_>,
    client: &dyn GithubApi,
    repo: &str,
) -> Envelope<Vec<Issue>> {
    let check = validate_credentials(ctx.config, &["token"], Provider::Github);
    if let Some(error) = check.error {
        return Envelope::fail(error);
    }

    let (owner, repo_name) = match resolve_repo(ctx.config, repo) {
        Ok(parts) => parts,
        Err(error) => return Envelope::fail(error),
    };

    let policy = ctx.policies.policy(Provider::Github);
    let raw = match with_rate_limit_retry(Provider::Github, policy, &ctx.cancel, || {
        client.list_issues(&owner, &repo_name)
    })
    .await
    {
        Ok(raw) => raw,
        Err(err) => return Envelope::fail(err),
    };

    let issues = raw
        .as_array()
        .map(|items| items.iter().filter_map(Issue::from_value).collect())
        .unwrap_or_default();

    Envelope::ok(issues)
}
