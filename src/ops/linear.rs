//! Linear operations: create issue.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::LinearApi;
use crate::config::ProviderConfig;
use crate::credentials::validate_credentials;
use crate::envelope::Envelope;
use crate::executor::{with_rate_limit_retry, OperationContext};
use crate::provider::Provider;
use crate::storage::run_write_through;

/// A Linear issue, trimmed to the fields the pipeline exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub url: String,
}

/// Whether a string is already a Linear team UUID.
fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    s.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}

/// Resolve a friendly team name to a team UUID.
fn resolve_team(config: &ProviderConfig, name: &str) -> Result<String, String> {
    if let Some(id) = config.resolve_alias(name) {
        return Ok(id.to_string());
    }
    if is_uuid(name) || config.channels.is_empty() {
        return Ok(name.to_string());
    }
    Err(format!(
        "team '{name}' not found, available options: {}",
        config.alias_names().join(", ")
    ))
}

/// Create an issue in a Linear team (by alias or team UUID).
pub async fn create_linear_issue(
    ctx: &OperationContext<'_>,
    client: &dyn LinearApi,
    team: &str,
    title: &str,
    description: Option<&str>,
) -> Envelope<LinearIssue> {
    let check = validate_credentials(ctx.config, &["apiKey"], Provider::Linear);
    if let Some(error) = check.error {
        return Envelope::fail(error);
    }

    let team_id = match resolve_team(ctx.config, team) {
        Ok(id) => id,
        Err(error) => return Envelope::fail(error),
    };

    let policy = ctx.policies.policy(Provider::Linear);
    let data = match with_rate_limit_retry(Provider::Linear, policy, &ctx.cancel, || {
        client.create_issue(&team_id, title, description)
    })
    .await
    {
        Ok(data) => data,
        Err(err) => return Envelope::fail(err),
    };

    let payload = data.get("issueCreate").unwrap_or(&data);
    let accepted = payload
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if !accepted {
        return Envelope::fail("linear rejected the issue");
    }

    let Some(raw) = payload.get("issue") else {
        return Envelope::fail("linear returned an unrecognized issue payload");
    };
    let issue = LinearIssue {
        id: raw
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        identifier: raw
            .get("identifier")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        title: raw
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(title)
            .to_string(),
        url: raw
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    };

    run_write_through(ctx.storage, "linear_issues", || {
        json!({
            "id": issue.id,
            "identifier": issue.identifier,
            "title": issue.title,
            "team_id": team_id,
            "url": issue.url,
            "caller": ctx.caller,
        })
    })
    .await;

    Envelope::ok(issue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("9cfb482a-81e3-4154-b5b9-2c805e70a02d"));
        assert!(!is_uuid("eng"));
        assert!(!is_uuid("9cfb482a81e34154b5b92c805e70a02d"));
        assert!(!is_uuid("9cfb482a-81e3-4154-b5b9-2c805e70a02z"));
    }

    #[test]
    fn test_resolve_team_alias() {
        let mut channels = HashMap::new();
        channels.insert(
            "eng".to_string(),
            "9cfb482a-81e3-4154-b5b9-2c805e70a02d".to_string(),
        );
        let config = ProviderConfig {
            channels,
            ..Default::default()
        };
        assert_eq!(
            resolve_team(&config, "eng").unwrap(),
            "9cfb482a-81e3-4154-b5b9-2c805e70a02d"
        );
        let err = resolve_team(&config, "design").unwrap_err();
        assert!(err.contains("'design' not found"));
        assert!(err.contains("eng"));
    }

    #[test]
    fn test_resolve_team_uuid_passthrough() {
        let mut channels = HashMap::new();
        channels.insert("eng".to_string(), "id".to_string());
        let config = ProviderConfig {
            channels,
            ..Default::default()
        };
        assert_eq!(
            resolve_team(&config, "11111111-2222-3333-4444-555555555555").unwrap(),
            "11111111-2222-3333-4444-555555555555"
        );
    }
}
