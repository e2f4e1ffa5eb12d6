//! Operation execution: the per-call context and the rate-limit retry loop.
//!
//! Every endpoint operation in [`crate::ops`] runs its client call through
//! [`with_rate_limit_retry`]: rate-limited responses wait per policy and try
//! again, everything else fails fast. One logical call per invocation, no
//! fan-out; concurrent invocations are independent.

use std::future::Future;

use reqwest::header::HeaderMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::ProviderConfig;
use crate::logging::targets;
use crate::provider::Provider;
use crate::ratelimit::{
    calculate_retry_delay, extract_rate_limit_info, is_rate_limit_error, PolicyRegistry,
    RateLimitConfig,
};
use crate::storage::Storage;

/// Error from a provider client call.
///
/// `Provider` carries the response metadata the retry loop needs to classify
/// the failure; `Transport` covers connection-level failures, which never
/// retry under the rate-limit policy.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{provider} API error (HTTP {status}): {message}")]
    Provider {
        provider: Provider,
        status: u16,
        message: String,
        body: String,
        headers: HeaderMap,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Transport error from a reqwest failure.
    pub fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Per-call bundle handed to every operation executor.
///
/// Holds borrowed, read-only collaborators; create one per invocation (or
/// reuse within a request scope). Never persisted.
pub struct OperationContext<'a> {
    pub config: &'a ProviderConfig,
    pub policies: &'a PolicyRegistry,
    pub storage: Option<&'a dyn Storage>,
    /// Caller identity, recorded into write-through rows when present.
    pub caller: Option<String>,
    pub cancel: CancellationToken,
}

impl<'a> OperationContext<'a> {
    pub fn new(config: &'a ProviderConfig, policies: &'a PolicyRegistry) -> Self {
        Self {
            config,
            policies,
            storage: None,
            caller: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_storage(mut self, storage: &'a dyn Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Run `call` with the provider's rate-limit retry policy.
///
/// `max_retries` counts retries after the first attempt, so a persistently
/// rate-limited call invokes `call` exactly `max_retries + 1` times.
/// Cancellation is checked before each wait; a cancelled call returns
/// [`ApiError::Cancelled`] instead of sleeping through the backoff.
pub async fn with_rate_limit_retry<T, F, Fut>(
    provider: Provider,
    policy: &RateLimitConfig,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt: u32 = 0;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let (status, body, headers) = match &err {
            ApiError::Provider {
                status,
                body,
                headers,
                ..
            } => (*status, body.as_str(), headers),
            // Transport failures and cancellation fail fast.
            _ => return Err(err),
        };

        if !is_rate_limit_error(status, body, policy) || attempt >= policy.max_retries {
            return Err(err);
        }

        attempt += 1;
        let info = extract_rate_limit_info(headers, policy);
        let delay = calculate_retry_delay(attempt, &info, policy);
        warn!(
            target: targets::RATELIMIT,
            provider = %provider,
            status,
            attempt,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            "rate limited, backing off"
        );

        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
