//! Operation executors, one per provider endpoint.
//!
//! Every operation follows the same pipeline: credential gate, alias
//! resolution, client call under the rate-limit retry loop, response shaping,
//! best-effort write-through, envelope. Expected failures come back as
//! `Envelope::Failure`; these functions do not panic on provider behavior.

pub mod github;
pub mod linear;
pub mod slack;

pub use github::{create_issue, list_issues, Issue};
pub use linear::{create_linear_issue, LinearIssue};
pub use slack::{list_channels, send_message, SentMessage, SlackChannel};
