//! outpost — provider API call pipeline
//!
//! Everything one outbound provider call needs, wrapped around an injected
//! client: credential validation, alias resolution, rate-limit detection with
//! policy-driven backoff and retry, response shaping into a uniform envelope,
//! and best-effort write-through of results into caller-supplied storage.
//! Inbound, the webhook module verifies provider signatures and emits
//! normalized events.
//!
//! ```no_run
//! use outpost::client::SlackHttp;
//! use outpost::executor::OperationContext;
//! use outpost::ratelimit::PolicyRegistry;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let providers = outpost::config::load_providers()?;
//! let slack = providers.get(outpost::Provider::Slack);
//! let policies = PolicyRegistry::standard();
//! let client = SlackHttp::new(slack.token.clone().unwrap_or_default());
//!
//! let ctx = OperationContext::new(&slack, &policies);
//! let envelope = outpost::ops::send_message(&ctx, &client, "general", "deploy done").await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod envelope;
pub mod executor;
pub mod logging;
pub mod ops;
pub mod provider;
pub mod ratelimit;
pub mod signature;
pub mod storage;
pub mod webhook;

pub use envelope::Envelope;
pub use executor::{ApiError, OperationContext};
pub use provider::Provider;
