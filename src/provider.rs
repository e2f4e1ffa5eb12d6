//! Supported API providers.
//!
//! Providers are a closed enum rather than free-form strings so that policy
//! lookups and config access are checked at compile time.

use serde::{Deserialize, Serialize};

/// A remote API provider the pipeline knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Slack,
    Github,
    Linear,
}

impl Provider {
    /// All providers, in a stable order.
    pub const ALL: [Provider; 3] = [Provider::Slack, Provider::Github, Provider::Linear];

    /// Lowercase wire/config name for this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Github => "github",
            Self::Linear => "linear",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slack" => Ok(Self::Slack),
            "github" => Ok(Self::Github),
            "linear" => Ok(Self::Linear),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized provider name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);
