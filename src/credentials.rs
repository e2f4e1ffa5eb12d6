//! Credential validation.
//!
//! Gates every operation executor before any network call: checks that the
//! provider config carries the credential fields the endpoint requires, and
//! aggregates everything missing into one actionable message.

use serde::Serialize;

use crate::config::ProviderConfig;
use crate::provider::Provider;

/// Outcome of a credential check. `error` is set iff `valid` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CredentialCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn missing(provider: Provider, fields: &[&str]) -> Self {
        let details: Vec<String> = fields
            .iter()
            .map(|field| {
                format!(
                    "{field} not configured for provider {provider}; set providers.{provider}.{field}"
                )
            })
            .collect();
        Self {
            valid: false,
            error: Some(details.join("; ")),
        }
    }
}

/// Check that every field in `required` is present and non-empty on `config`.
///
/// Deterministic, no side effects, never fails: unknown field names count as
/// missing. Field names use the config's wire spelling (`token`, `apiKey`,
/// `apiSecret`, `webhookSecret`).
pub fn validate_credentials(
    config: &ProviderConfig,
    required: &[&str],
    provider: Provider,
) -> CredentialCheck {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|field| {
            config
                .credential(field)
                .map(|value| value.is_empty())
                .unwrap_or(true)
        })
        .collect();

    if missing.is_empty() {
        CredentialCheck::ok()
    } else {
        CredentialCheck::missing(provider, &missing)
    }
}
