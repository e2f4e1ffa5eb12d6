//! GitHub webhook ingestion.

use super::{parse_body, WebhookEvent, WebhookOutcome, WebhookRequest};
use crate::envelope::Envelope;
use crate::signature::verify_github_signature;

pub(super) const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub(super) const EVENT_HEADER: &str = "x-github-event";

pub(super) fn ingest(request: &WebhookRequest, secret: Option<&str>) -> Envelope<WebhookOutcome> {
    if let Some(secret) = secret {
        let Some(signature) = request.header(SIGNATURE_HEADER) else {
            return Envelope::fail(format!("missing {SIGNATURE_HEADER} signature header"));
        };
        if !verify_github_signature(secret, signature, request.body.as_bytes()) {
            return Envelope::fail("github signature verification failed");
        }
    }

    let payload = match parse_body(request) {
        Ok(payload) => payload,
        Err(error) => return Envelope::fail(error),
    };

    let Some(event) = request.header(EVENT_HEADER) else {
        return Envelope::fail(format!("missing {EVENT_HEADER} header"));
    };

    // GitHub's convention: event name plus the payload action, e.g.
    // "issues.opened".
    let event_type = match payload.get("action").and_then(|v| v.as_str()) {
        Some(action) => format!("{event}.{action}"),
        None => event.to_string(),
    };

    Envelope::ok(WebhookOutcome::Event(WebhookEvent {
        event_type,
        payload,
    }))
}
