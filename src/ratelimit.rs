//! Rate-limit policy.
//!
//! Pure functions that decide whether a provider response denotes
//! rate-limiting, extract limit metadata from response headers, and compute
//! the retry delay. The retry loop itself lives in [`crate::executor`]; this
//! module owns only the decisions.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::provider::Provider;

/// Computed backoff never exceeds this; a server-directed `retry-after` may.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Rate-limit metadata extracted from one response's headers.
///
/// Derived per-response and consumed immediately by the retry decision;
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Server-directed wait before the next attempt.
    pub retry_after: Option<Duration>,
    /// When the limit window resets, epoch milliseconds.
    pub reset_at_ms: Option<u64>,
    /// Requests remaining in the current window.
    pub remaining: Option<u32>,
    /// Total requests allowed per window.
    pub limit: Option<u32>,
}

/// Header names carrying rate-limit metadata, per provider convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitHeaders {
    pub retry_after: &'static str,
    pub limit: &'static str,
    pub remaining: &'static str,
    pub reset: &'static str,
}

impl Default for RateLimitHeaders {
    fn default() -> Self {
        Self {
            retry_after: "retry-after",
            limit: "x-rate-limit-limit",
            remaining: "x-rate-limit-remaining",
            reset: "x-rate-limit-reset",
        }
    }
}

impl RateLimitHeaders {
    /// GitHub's header set (`x-ratelimit-*`, reset in epoch seconds).
    pub fn github() -> Self {
        Self {
            retry_after: "retry-after",
            limit: "x-ratelimit-limit",
            remaining: "x-ratelimit-remaining",
            reset: "x-ratelimit-reset",
        }
    }
}

/// Per-provider retry policy. Immutable after startup.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// When false, no response is ever classified as rate-limited and every
    /// failure fails fast.
    pub enabled: bool,
    /// Retries after the first attempt; a persistently limited call touches
    /// the client `max_retries + 1` times.
    pub max_retries: u32,
    pub initial_retry_delay: Duration,
    pub backoff_multiplier: f64,
    pub headers: RateLimitHeaders,
    /// Provider-specific classification beyond HTTP 429.
    pub is_rate_limit_error: Option<fn(u16, &str) -> bool>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_retry_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            headers: RateLimitHeaders::default(),
            is_rate_limit_error: None,
        }
    }
}

/// GitHub reports secondary rate limits as 403 with an explanatory body.
fn github_rate_limit_body(status: u16, body: &str) -> bool {
    status == 403 && body.to_ascii_lowercase().contains("rate limit")
}

/// Immutable table of per-provider policies, built by the composition root.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    default: RateLimitConfig,
    overrides: HashMap<Provider, RateLimitConfig>,
}

impl PolicyRegistry {
    /// The stock policy set: defaults everywhere, GitHub's distinct headers
    /// and 403-body classification.
    pub fn standard() -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(
            Provider::Github,
            RateLimitConfig {
                headers: RateLimitHeaders::github(),
                is_rate_limit_error: Some(github_rate_limit_body),
                ..Default::default()
            },
        );
        Self {
            default: RateLimitConfig::default(),
            overrides,
        }
    }

    /// Replace the policy for one provider.
    pub fn with_policy(mut self, provider: Provider, config: RateLimitConfig) -> Self {
        self.overrides.insert(provider, config);
        self
    }

    /// The policy for one provider (the default when no override exists).
    pub fn policy(&self, provider: Provider) -> &RateLimitConfig {
        self.overrides.get(&provider).unwrap_or(&self.default)
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Read rate-limit metadata from response headers per the policy's header
/// names. Unparseable values are omitted, never errors.
pub fn extract_rate_limit_info(headers: &HeaderMap, config: &RateLimitConfig) -> RateLimitInfo {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    extract_rate_limit_info_at(headers, config, now_ms)
}

/// Extraction with an explicit "now", for deterministic tests.
pub fn extract_rate_limit_info_at(
    headers: &HeaderMap,
    config: &RateLimitConfig,
    now_ms: u64,
) -> RateLimitInfo {
    let mut info = RateLimitInfo::default();

    if let Some(secs) = header_str(headers, config.headers.retry_after)
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        info.retry_after = Some(Duration::from_secs(secs));
    }

    if let Some(reset) =
        header_str(headers, config.headers.reset).and_then(|v| v.trim().parse::<u64>().ok())
    {
        // Mixed provider convention: values above 1e12 are already epoch
        // milliseconds, smaller ones are epoch seconds. Provider-format
        // dependent, not a universal rule.
        let reset_ms = if reset > 1_000_000_000_000 {
            reset
        } else {
            reset * 1000
        };
        info.reset_at_ms = Some(reset_ms);

        // A future reset implies a wait, but the retry-after header wins.
        if info.retry_after.is_none() && reset_ms > now_ms {
            info.retry_after = Some(Duration::from_millis(reset_ms - now_ms));
        }
    }

    info.remaining =
        header_str(headers, config.headers.remaining).and_then(|v| v.trim().parse().ok());
    info.limit = header_str(headers, config.headers.limit).and_then(|v| v.trim().parse().ok());

    info
}

/// Whether a response classifies as rate-limited under this policy.
///
/// HTTP 429 always does (when the policy is enabled); beyond that the
/// provider predicate decides.
pub fn is_rate_limit_error(status: u16, body: &str, config: &RateLimitConfig) -> bool {
    if !config.enabled {
        return false;
    }
    if status == 429 {
        return true;
    }
    match config.is_rate_limit_error {
        Some(predicate) => predicate(status, body),
        None => false,
    }
}

/// Delay before retry number `attempt` (1-indexed).
///
/// A server-directed `retry_after` is used verbatim; otherwise exponential
/// backoff from the policy, capped at [`MAX_BACKOFF`].
pub fn calculate_retry_delay(
    attempt: u32,
    info: &RateLimitInfo,
    config: &RateLimitConfig,
) -> Duration {
    if let Some(retry_after) = info.retry_after {
        return retry_after;
    }
    let exp = attempt.saturating_sub(1).min(30);
    let factor = config.backoff_multiplier.max(1.0).powi(exp as i32);
    let delay = config.initial_retry_delay.as_secs_f64() * factor;
    Duration::from_secs_f64(delay.min(MAX_BACKOFF.as_secs_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_retry_after_seconds_to_duration() {
        let info = extract_rate_limit_info_at(
            &headers(&[("retry-after", "2")]),
            &RateLimitConfig::default(),
            0,
        );
        assert_eq!(info.retry_after, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_reset_seconds_heuristic() {
        let now_ms = 1_700_000_000_000;
        let info = extract_rate_limit_info_at(
            &headers(&[("x-rate-limit-reset", "1700000005")]),
            &RateLimitConfig::default(),
            now_ms,
        );
        assert_eq!(info.reset_at_ms, Some(1_700_000_005_000));
        assert_eq!(info.retry_after, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_reset_milliseconds_heuristic() {
        let now_ms = 1_700_000_000_000;
        let info = extract_rate_limit_info_at(
            &headers(&[("x-rate-limit-reset", "1700000003000")]),
            &RateLimitConfig::default(),
            now_ms,
        );
        assert_eq!(info.reset_at_ms, Some(1_700_000_003_000));
        assert_eq!(info.retry_after, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_retry_after_header_wins_over_reset() {
        let now_ms = 1_700_000_000_000;
        let info = extract_rate_limit_info_at(
            &headers(&[("retry-after", "1"), ("x-rate-limit-reset", "1700000009")]),
            &RateLimitConfig::default(),
            now_ms,
        );
        assert_eq!(info.retry_after, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_past_reset_derives_nothing() {
        let now_ms = 1_700_000_000_000;
        let info = extract_rate_limit_info_at(
            &headers(&[("x-rate-limit-reset", "1600000000")]),
            &RateLimitConfig::default(),
            now_ms,
        );
        assert_eq!(info.retry_after, None);
        assert!(info.reset_at_ms.is_some());
    }

    #[test]
    fn test_unparseable_headers_omitted() {
        let info = extract_rate_limit_info_at(
            &headers(&[
                ("retry-after", "soon"),
                ("x-rate-limit-remaining", "n/a"),
                ("x-rate-limit-limit", "100"),
            ]),
            &RateLimitConfig::default(),
            0,
        );
        assert_eq!(info.retry_after, None);
        assert_eq!(info.remaining, None);
        assert_eq!(info.limit, Some(100));
    }

    #[test]
    fn test_github_header_names() {
        let config = PolicyRegistry::standard();
        let policy = config.policy(Provider::Github);
        let info = extract_rate_limit_info_at(
            &headers(&[
                ("x-ratelimit-remaining", "0"),
                ("x-ratelimit-limit", "5000"),
            ]),
            policy,
            0,
        );
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.limit, Some(5000));
    }

    #[test]
    fn test_429_is_always_rate_limited() {
        let config = RateLimitConfig::default();
        assert!(is_rate_limit_error(429, "", &config));
        assert!(!is_rate_limit_error(500, "", &config));
        assert!(!is_rate_limit_error(403, "rate limit exceeded", &config));
    }

    #[test]
    fn test_disabled_policy_never_classifies() {
        let config = RateLimitConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!is_rate_limit_error(429, "", &config));
    }

    #[test]
    fn test_github_403_body_predicate() {
        let registry = PolicyRegistry::standard();
        let policy = registry.policy(Provider::Github);
        assert!(is_rate_limit_error(
            403,
            "API rate limit exceeded for user",
            policy
        ));
        assert!(!is_rate_limit_error(403, "Resource not accessible", policy));
        assert!(is_rate_limit_error(429, "", policy));
    }

    #[test]
    fn test_backoff_monotonic_and_capped() {
        let config = RateLimitConfig {
            initial_retry_delay: Duration::from_millis(500),
            backoff_multiplier: 3.0,
            ..Default::default()
        };
        let info = RateLimitInfo::default();
        let mut prev = Duration::ZERO;
        for attempt in 1..=20 {
            let delay = calculate_retry_delay(attempt, &info, &config);
            assert!(delay >= prev, "attempt {attempt} regressed");
            assert!(delay <= MAX_BACKOFF);
            prev = delay;
        }
        assert_eq!(
            calculate_retry_delay(1, &info, &config),
            Duration::from_millis(500)
        );
        assert_eq!(
            calculate_retry_delay(2, &info, &config),
            Duration::from_millis(1500)
        );
        assert_eq!(calculate_retry_delay(20, &info, &config), MAX_BACKOFF);
    }

    #[test]
    fn test_server_retry_after_wins_verbatim() {
        let config = RateLimitConfig::default();
        let info = RateLimitInfo {
            retry_after: Some(Duration::from_secs(90)),
            ..Default::default()
        };
        // Server-directed waits are honored even above the computed cap.
        assert_eq!(
            calculate_retry_delay(1, &info, &config),
            Duration::from_secs(90)
        );
    }

    #[test]
    fn test_policy_registry_default_and_override() {
        let registry = PolicyRegistry::standard().with_policy(
            Provider::Slack,
            RateLimitConfig {
                max_retries: 7,
                ..Default::default()
            },
        );
        assert_eq!(registry.policy(Provider::Slack).max_retries, 7);
        assert_eq!(registry.policy(Provider::Linear).max_retries, 3);
        assert_eq!(
            registry.policy(Provider::Github).headers,
            RateLimitHeaders::github()
        );
    }
}
