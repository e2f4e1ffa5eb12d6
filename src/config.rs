//! Provider configuration.
//!
//! Per-provider settings (credentials, alias maps, webhook secrets) loaded
//! once at startup by the composition root and treated as read-only by the
//! pipeline. The on-disk format is a flat JSON object keyed by provider name:
//!
//! ```json
//! {
//!   "slack": { "token": "xoxb-…", "channels": { "general": "C024BE91L" } },
//!   "github": { "token": "ghp_…", "webhookSecret": "…" },
//!   "linear": { "apiKey": "lin_api_…" }
//! }
//! ```
//!
//! Missing credential fields fall back to conventional environment variables
//! (`SLACK_TOKEN`, `GITHUB_TOKEN`, `LINEAR_API_KEY`, `<PROVIDER>_WEBHOOK_SECRET`).

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::logging::targets;
use crate::provider::Provider;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Settings for one provider. All fields optional; each operation declares
/// which credential fields it actually requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Bearer/bot token (Slack, GitHub).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// API key (Linear).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API secret, for providers using key+secret pairs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// Friendly alias -> provider-native resource ID (e.g. channel or team).
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub channels: HashMap<String, String>,
    /// Secret used to verify inbound webhook signatures. Absent means
    /// verification is skipped — a deliberate caller choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

impl ProviderConfig {
    /// Look up a credential field by its config name.
    ///
    /// Returns `None` for unknown field names, which the credential validator
    /// reports the same way as a missing value.
    pub fn credential(&self, field: &str) -> Option<&str> {
        match field {
            "token" => self.token.as_deref(),
            "apiKey" => self.api_key.as_deref(),
            "apiSecret" => self.api_secret.as_deref(),
            "webhookSecret" => self.webhook_secret.as_deref(),
            _ => None,
        }
    }

    /// Resolve a friendly alias to a provider-native ID, if mapped.
    pub fn resolve_alias(&self, name: &str) -> Option<&str> {
        self.channels.get(name).map(String::as_str)
    }

    /// Sorted list of configured aliases, for "available options" messages.
    pub fn alias_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.channels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The full provider table, immutable after startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Providers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear: Option<ProviderConfig>,
}

impl Providers {
    /// Settings for one provider; an absent section reads as an empty config
    /// so missing credentials surface through the validator, not as panics.
    pub fn get(&self, provider: Provider) -> ProviderConfig {
        let section = match provider {
            Provider::Slack => &self.slack,
            Provider::Github => &self.github,
            Provider::Linear => &self.linear,
        };
        section.clone().unwrap_or_default()
    }

    fn get_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        let section = match provider {
            Provider::Slack => &mut self.slack,
            Provider::Github => &mut self.github,
            Provider::Linear => &mut self.linear,
        };
        section.get_or_insert_with(ProviderConfig::default)
    }
}

/// Get the config file path.
/// Priority: OUTPOST_CONFIG_PATH > ~/.outpost/outpost.json
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("OUTPOST_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    let base = env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    base.join(".outpost").join("outpost.json")
}

/// Load the provider table from the default config path, then apply
/// environment fallbacks. A missing file yields an empty table.
pub fn load_providers() -> Result<Providers, ConfigError> {
    load_providers_from(&get_config_path())
}

/// Load the provider table from an explicit path, then apply environment
/// fallbacks.
pub fn load_providers_from(path: &Path) -> Result<Providers, ConfigError> {
    let mut providers = if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
    } else {
        debug!(target: targets::CONFIG, path = %path.display(), "config file absent, starting empty");
        Providers::default()
    };

    apply_env_fallbacks(&mut providers);
    Ok(providers)
}

/// Fill unset credential fields from conventional environment variables.
/// Values already present in the file always win.
fn apply_env_fallbacks(providers: &mut Providers) {
    for provider in Provider::ALL {
        let prefix = provider.name().to_uppercase();
        let token_var = match provider {
            Provider::Linear => format!("{prefix}_API_KEY"),
            _ => format!("{prefix}_TOKEN"),
        };
        let token = env::var(&token_var).ok().filter(|v| !v.is_empty());
        let secret = env::var(format!("{prefix}_WEBHOOK_SECRET"))
            .ok()
            .filter(|v| !v.is_empty());

        // Leave absent sections absent unless the environment has something
        // to contribute.
        if token.is_none() && secret.is_none() {
            continue;
        }

        let section = providers.get_mut(provider);
        if let Some(value) = token {
            match provider {
                Provider::Linear => {
                    section.api_key.get_or_insert(value);
                }
                _ => {
                    section.token.get_or_insert(value);
                }
            }
        }
        if let Some(value) = secret {
            section.webhook_secret.get_or_insert(value);
        }
    }
}
