//! Slack Events API ingestion.

use serde_json::Value;

use super::{parse_body, WebhookEvent, WebhookOutcome, WebhookRequest};
use crate::envelope::Envelope;
use crate::signature::verify_slack_signature;

pub(super) const SIGNATURE_HEADER: &str = "x-slack-signature";
pub(super) const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// A normalized inbound Slack message, pulled out of an `event_callback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: String,
    pub channel_id: String,
    pub text: String,
}

pub(super) fn ingest(request: &WebhookRequest, secret: Option<&str>) -> Envelope<WebhookOutcome> {
    let payload = match parse_body(request) {
        Ok(payload) => payload,
        Err(error) => return Envelope::fail(error),
    };

    // Endpoint-registration handshake: echo the challenge back before (and
    // instead of) signature verification.
    if payload.get("type").and_then(|v| v.as_str()) == Some("url_verification") {
        let Some(challenge) = payload.get("challenge").and_then(|v| v.as_str()) else {
            return Envelope::fail("url_verification payload missing challenge");
        };
        return Envelope::ok(WebhookOutcome::Challenge {
            challenge: challenge.to_string(),
        });
    }

    if let Some(secret) = secret {
        let Some(signature) = request.header(SIGNATURE_HEADER) else {
            return Envelope::fail(format!("missing {SIGNATURE_HEADER} header"));
        };
        let Some(timestamp) = request
            .header(TIMESTAMP_HEADER)
            .and_then(|v| v.trim().parse::<i64>().ok())
        else {
            return Envelope::fail(format!("missing or invalid {TIMESTAMP_HEADER} header"));
        };
        if !verify_slack_signature(secret, timestamp, signature, request.body.as_bytes()) {
            return Envelope::fail("slack signature verification failed");
        }
    }

    let event_type = match payload.get("type").and_then(|v| v.as_str()) {
        Some("event_callback") => payload
            .get("event")
            .and_then(|e| e.get("type"))
            .and_then(|v| v.as_str())
            .unwrap_or("event_callback")
            .to_string(),
        Some(other) => other.to_string(),
        None => return Envelope::fail("slack payload missing type"),
    };

    Envelope::ok(WebhookOutcome::Event(WebhookEvent {
        event_type,
        payload,
    }))
}

/// Extract a text message from a Slack event object, ignoring bot subtypes
/// and non-message events.
pub fn extract_message(event: &Value) -> Option<InboundMessage> {
    let event_type = event.get("type").and_then(|v| v.as_str())?;
    if event_type != "message" && event_type != "app_mention" {
        return None;
    }
    if event_type == "message" && event.get("subtype").is_some() {
        return None;
    }

    let text = event.get("text").and_then(|v| v.as_str())?;
    if text.is_empty() {
        return None;
    }

    Some(InboundMessage {
        sender_id: event.get("user").and_then(|v| v.as_str())?.to_string(),
        channel_id: event.get("channel").and_then(|v| v.as_str())?.to_string(),
        text: text.to_string(),
    })
}

/// Build the event payload Slack would wrap around a message, for tests and
/// local replay tooling.
#[cfg(test)]
pub(crate) fn event_callback(event: Value) -> Value {
    serde_json::json!({
        "type": "event_callback",
        "event": event,
    })
}
