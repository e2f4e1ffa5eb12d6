//! Slack operations: send message, list channels.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::SlackApi;
use crate::config::ProviderConfig;
use crate::credentials::validate_credentials;
use crate::envelope::Envelope;
use crate::executor::{with_rate_limit_retry, OperationContext};
use crate::provider::Provider;
use crate::storage::run_write_through;

/// A message accepted by Slack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub channel_id: String,
    pub ts: String,
    pub text: String,
}

/// One conversation from `conversations.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
}

/// Whether a string already looks like a Slack conversation ID
/// (C/D/G prefix followed by uppercase alphanumerics).
fn is_channel_id(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, 'C' | 'D' | 'G')
        && s.len() >= 7
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Resolve a friendly channel name to a conversation ID.
///
/// The alias map is consulted first; native-looking IDs pass through, and an
/// empty map passes everything through.
fn resolve_channel(config: &ProviderConfig, name: &str) -> Result<String, String> {
    if let Some(id) = config.resolve_alias(name) {
        return Ok(id.to_string());
    }
    if is_channel_id(name) || config.channels.is_empty() {
        return Ok(name.to_string());
    }
    Err(format!(
        "channel '{name}' not found, available options: {}",
        config.alias_names().join(", ")
    ))
}

/// Send a text message to a Slack channel (by alias or conversation ID).
pub async fn send_message(
    ctx: &OperationContext<'_>,
    client: &dyn SlackApi,
    channel: &str,
    text: &str,
) -> Envelope<SentMessage> {
    let check = validate_credentials(ctx.config, &["token"], Provider::Slack);
    if let Some(error) = check.error {
        return Envelope::fail(error);
    }

    let channel_id = match resolve_channel(ctx.config, channel) {
        Ok(id) => id,
        Err(error) => return Envelope::fail(error),
    };

    let policy = ctx.policies.policy(Provider::Slack);
    let body = match with_rate_limit_retry(Provider::Slack, policy, &ctx.cancel, || {
        client.post_message(&channel_id, text)
    })
    .await
    {
        Ok(body) => body,
        Err(err) => return Envelope::fail(err),
    };

    let message = SentMessage {
        channel_id: body
            .get("channel")
            .and_then(|v| v.as_str())
            .unwrap_or(&channel_id)
            .to_string(),
        ts: body
            .get("ts")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        text: body
            .get("message")
            .and_then(|m| m.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or(text)
            .to_string(),
    };

    run_write_through(ctx.storage, "slack_messages", || {
        json!({
            "channel_id": message.channel_id,
            "ts": message.ts,
            "text": message.text,
            "caller": ctx.caller,
        })
    })
    .await;

    Envelope::ok(message)
}

/// List conversations visible to the configured token.
pub async fn list_channels(
    ctx: &OperationContext<'_>,
    client: &dyn SlackApi,
) -> Envelope<Vec<SlackChannel>> {
    let check = validate_credentials(ctx.config, &["token"], Provider::Slack);
    if let Some(error) = check.error {
        return Envelope::fail(error);
    }

    let policy = ctx.policies.policy(Provider::Slack);
    let body = match with_rate_limit_retry(Provider::Slack, policy, &ctx.cancel, || {
        client.list_channels()
    })
    .await
    {
        Ok(body) => body,
        Err(err) => return Envelope::fail(err),
    };

    let channels = body
        .get("channels")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(SlackChannel {
                        id: item.get("id")?.as_str()?.to_string(),
                        name: item
                            .get("name")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        is_private: item
                            .get("is_private")
                            .and_then(|v| v.as_bool())
                            .unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Envelope::ok(channels)
}
