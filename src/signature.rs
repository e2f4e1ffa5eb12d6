//! Webhook signature verification.
//!
//! Per-provider HMAC-SHA256 schemes over the raw request body:
//!
//! - Slack: `v0={hex}` over `v0:{timestamp}:{body}`, with a 300 s replay
//!   window on the timestamp header.
//! - GitHub: `sha256={hex}` over the body.
//! - Linear: bare hex over the body.
//!
//! All comparisons go through [`timing_safe_eq`]; a length mismatch returns
//! `false` rather than failing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Slack signature version prefix.
pub const SLACK_SIGNATURE_VERSION: &str = "v0";

/// Maximum allowed clock skew for Slack signatures (5 minutes).
pub const SLACK_SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// GitHub signature header value prefix.
pub const GITHUB_SIGNATURE_PREFIX: &str = "sha256=";

/// Constant-time equality over byte strings.
///
/// Accumulates XOR over the full length instead of early-exiting, so the
/// comparison time does not leak the position of the first mismatch.
pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut out = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        out |= x ^ y;
    }
    out == 0
}

/// Hex-encoded HMAC-SHA256 of `message` under `secret`.
fn hmac_sha256_hex(secret: &str, message: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a Slack request signature against the raw body.
///
/// Applies the replay window against the current clock before checking the
/// signature at all.
pub fn verify_slack_signature(
    signing_secret: &str,
    timestamp: i64,
    signature: &str,
    body: &[u8],
) -> bool {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    verify_slack_signature_at(signing_secret, timestamp, signature, body, now)
}

/// Slack verification with an explicit "now", for deterministic tests.
pub fn verify_slack_signature_at(
    signing_secret: &str,
    timestamp: i64,
    signature: &str,
    body: &[u8],
    now_secs: i64,
) -> bool {
    // abs_diff: the timestamp is attacker-controlled, so plain subtraction
    // could overflow.
    if now_secs.abs_diff(timestamp) > SLACK_SIGNATURE_TOLERANCE_SECS as u64 {
        return false;
    }

    let body_str = String::from_utf8_lossy(body);
    let base = format!("{SLACK_SIGNATURE_VERSION}:{timestamp}:{body_str}");
    let Some(digest) = hmac_sha256_hex(signing_secret, base.as_bytes()) else {
        return false;
    };
    let expected = format!("{SLACK_SIGNATURE_VERSION}={digest}");
    timing_safe_eq(expected.as_bytes(), signature.as_bytes())
}

/// Verify a GitHub `x-hub-signature-256` header value against the raw body.
pub fn verify_github_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let Some(digest) = hmac_sha256_hex(secret, body) else {
        return false;
    };
    let expected = format!("{GITHUB_SIGNATURE_PREFIX}{digest}");
    timing_safe_eq(expected.as_bytes(), signature.as_bytes())
}

/// Verify a Linear `linear-signature` header value against the raw body.
pub fn verify_linear_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let Some(expected) = hmac_sha256_hex(secret, body) else {
        return false;
    };
    timing_safe_eq(expected.as_bytes(), signature.as_bytes())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn slack_sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let base = format!(
            "{}:{}:{}",
            SLACK_SIGNATURE_VERSION,
            timestamp,
            String::from_utf8_lossy(body)
        );
        format!(
            "{}={}",
            SLACK_SIGNATURE_VERSION,
            hmac_sha256_hex(secret, base.as_bytes()).unwrap()
        )
    }

    #[test]
    fn test_timing_safe_eq() {
        assert!(timing_safe_eq(b"abc", b"abc"));
        assert!(!timing_safe_eq(b"abc", b"abd"));
        assert!(!timing_safe_eq(b"abc", b"ab"));
        assert!(timing_safe_eq(b"", b""));
    }

    #[test]
    fn test_slack_signature_valid() {
        let secret = "8f742231b10e8888abcd99yyyzzz85a5";
        let body = br#"{"type":"event_callback"}"#;
        let ts = 1_700_000_000;
        let sig = slack_sign(secret, ts, body);
        assert!(verify_slack_signature_at(secret, ts, &sig, body, ts + 10));
    }

    #[test]
    fn test_slack_signature_wrong_secret() {
        let body = b"payload";
        let ts = 1_700_000_000;
        let sig = slack_sign("secret-a", ts, body);
        assert!(!verify_slack_signature_at("secret-b", ts, &sig, body, ts));
    }

    #[test]
    fn test_slack_signature_mutated_body() {
        let secret = "s3cr3t";
        let ts = 1_700_000_000;
        let sig = slack_sign(secret, ts, b"payload");
        assert!(!verify_slack_signature_at(secret, ts, &sig, b"payloae", ts));
    }

    #[test]
    fn test_slack_replay_window_rejects_old_timestamp() {
        let secret = "s3cr3t";
        let body = b"payload";
        let ts = 1_700_000_000;
        let sig = slack_sign(secret, ts, body);
        // Correct signature, but 301s in the past.
        assert!(!verify_slack_signature_at(secret, ts, &sig, body, ts + 301));
        // Future skew beyond the window is rejected too.
        assert!(!verify_slack_signature_at(secret, ts, &sig, body, ts - 301));
        // Exactly at the window edge is accepted.
        assert!(verify_slack_signature_at(secret, ts, &sig, body, ts + 300));
    }

    #[test]
    fn test_slack_extreme_timestamps_rejected_without_panic() {
        let secret = "s3cr3t";
        let body = b"payload";
        let now = 1_700_000_000;
        for ts in [i64::MIN, i64::MAX, -1, 0] {
            let sig = slack_sign(secret, ts, body);
            assert!(!verify_slack_signature_at(secret, ts, &sig, body, now));
        }
    }

    #[test]
    fn test_slack_length_mismatch_returns_false() {
        assert!(!verify_slack_signature_at(
            "s3cr3t",
            1_700_000_000,
            "v0=short",
            b"payload",
            1_700_000_000
        ));
    }

    #[test]
    fn test_github_signature_valid() {
        let secret = "gh-secret";
        let body = br#"{"action":"opened"}"#;
        let digest = hmac_sha256_hex(secret, body).unwrap();
        let sig = format!("sha256={digest}");
        assert!(verify_github_signature(secret, &sig, body));
    }

    #[test]
    fn test_github_signature_missing_prefix() {
        let secret = "gh-secret";
        let body = b"payload";
        let digest = hmac_sha256_hex(secret, body).unwrap();
        assert!(!verify_github_signature(secret, &digest, body));
    }

    #[test]
    fn test_github_signature_single_bit_flip() {
        let secret = "gh-secret";
        let body = b"payload";
        let digest = hmac_sha256_hex(secret, body).unwrap();
        let mut sig = format!("sha256={digest}").into_bytes();
        let last = sig.len() - 1;
        sig[last] ^= 0x01;
        let sig = String::from_utf8(sig).unwrap();
        assert!(!verify_github_signature(secret, &sig, body));
    }

    #[test]
    fn test_linear_signature_valid() {
        let secret = "lin-secret";
        let body = br#"{"type":"Issue"}"#;
        let sig = hmac_sha256_hex(secret, body).unwrap();
        assert!(verify_linear_signature(secret, &sig, body));
        assert!(!verify_linear_signature(secret, &sig, b"other"));
    }
}
