//! Linear webhook ingestion.

use super::{parse_body, WebhookEvent, WebhookOutcome, WebhookRequest};
use crate::envelope::Envelope;
use crate::signature::verify_linear_signature;

pub(super) const SIGNATURE_HEADER: &str = "linear-signature";

pub(super) fn ingest(request: &WebhookRequest, secret: Option<&str>) -> Envelope<WebhookOutcome> {
    if let Some(secret) = secret {
        let Some(signature) = request.header(SIGNATURE_HEADER) else {
            return Envelope::fail(format!("missing {SIGNATURE_HEADER} signature header"));
        };
        if !verify_linear_signature(secret, signature, request.body.as_bytes()) {
            return Envelope::fail("linear signature verification failed");
        }
    }

    let payload = match parse_body(request) {
        Ok(payload) => payload,
        Err(error) => return Envelope::fail(error),
    };

    // Linear sends an entity type plus an action, e.g. "Issue" + "create".
    let Some(entity) = payload.get("type").and_then(|v| v.as_str()) else {
        return Envelope::fail("linear payload missing type");
    };
    let event_type = match payload.get("action").and_then(|v| v.as_str()) {
        Some(action) => format!("{entity}.{action}"),
        None => entity.to_string(),
    };

    Envelope::ok(WebhookOutcome::Event(WebhookEvent {
        event_type,
        payload,
    }))
}
