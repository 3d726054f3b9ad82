//! Capability trait for social media back ends.
//!
//! Each platform implements [`SocialService`] once. The registry stores them
//! as trait objects and actions call into them by kind; nothing above this
//! layer knows which platform it is talking to.

use async_trait::async_trait;
use thiserror::Error;

/// Why a back end refused or failed an action.
///
/// The `Display` output is shown to the chat user as-is, so every variant
/// renders as a complete sentence.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("`{url}` is not a link to a post on {service}.")]
    InvalidTarget { service: String, url: String },

    #[error("Could not find the post at `{url}` on {service}.")]
    NotFound { service: String, url: String },

    #[error("{service} rejected the request ({status}): {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Could not reach {service}: {source}")]
    Transport {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} cannot do that: {reason}.")]
    Unsupported { service: String, reason: String },

    #[error("{service} did not respond within {secs}s.")]
    Timeout { service: String, secs: u64 },

    /// Free-form refusal, already phrased for the user.
    #[error("{0}")]
    Rejected(String),
}

/// Operation set every social media back end supports.
///
/// Implementations must be `Send + Sync`: one instance is shared by every
/// request the gateway handles concurrently.
#[async_trait]
pub trait SocialService: Send + Sync {
    /// Back-end kind (e.g. `"twitter"`, `"log"`).
    fn name(&self) -> &str;

    /// Publish a new post.
    async fn make(
        &self,
        actor_id: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError>;

    /// Publish a post in reply to `target_url`.
    async fn reply(
        &self,
        actor_id: &str,
        target_url: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError>;

    /// Remove the post at `target_url`.
    async fn delete(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError>;

    /// Re-share (boost, retweet) the post at `target_url`.
    async fn share(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError>;

    /// Undo a previous [`share`](SocialService::share).
    async fn unshare(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError>;
}
