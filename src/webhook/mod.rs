//! Inbound webhook ingestion.
//!
//! Framework-agnostic boundary: callers mount [`ingest`] behind any HTTP
//! handler, passing raw headers and body. The handler verifies the provider
//! signature (when a secret is configured), classifies the event type, and
//! emits a normalized event for downstream dispatch. An unverified request is
//! rejected before any event is produced.

mod github;
mod linear;
mod slack;

pub use slack::{extract_message, InboundMessage};

use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::envelope::Envelope;
use crate::logging::targets;
use crate::provider::Provider;

/// Raw inbound webhook request.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub headers: HeaderMap,
    pub body: String,
}

impl WebhookRequest {
    pub fn new(headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// A header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A verified, classified webhook event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub event_type: String,
    pub payload: Value,
}

/// Result of ingesting a webhook request.
///
/// `Challenge` is Slack's endpoint-registration handshake: the caller must
/// echo the challenge value back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebhookOutcome {
    Challenge { challenge: String },
    Event(WebhookEvent),
}

/// Ingest an inbound webhook request for a provider.
///
/// `secret` absent means signature verification is skipped entirely — a
/// deliberate configuration choice owned by the caller.
pub fn ingest(
    provider: Provider,
    request: &WebhookRequest,
    secret: Option<&str>,
) -> Envelope<WebhookOutcome> {
    let result = match provider {
        Provider::Slack => slack::ingest(request, secret),
        Provider::Github => github::ingest(request, secret),
        Provider::Linear => linear::ingest(request, secret),
    };
    if let Envelope::Failure(error) = &result {
        debug!(target: targets::WEBHOOK, provider = %provider, error = %error, "webhook rejected");
    }
    result
}

/// Parse the raw body as JSON, or fail the envelope.
pub(crate) fn parse_body(request: &WebhookRequest) -> Result<Value, String> {
    serde_json::from_str(&request.body).map_err(|e| format!("invalid webhook body: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_wire_shapes() {
        let challenge = WebhookOutcome::Challenge {
            challenge: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&challenge).unwrap(),
            serde_json::json!({"challenge": "abc"})
        );

        let event = WebhookOutcome::Event(WebhookEvent {
            event_type: "issues.opened".to_string(),
            payload: serde_json::json!({"action": "opened"}),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "eventType": "issues.opened",
                "payload": {"action": "opened"}
            })
        );
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let request = WebhookRequest::new(HeaderMap::new(), "{not json");
        let err = parse_body(&request).unwrap_err();
        assert!(err.contains("invalid webhook body"));
    }
}
