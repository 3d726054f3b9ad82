//! Social media back ends.
//!
//! Each platform implements [`SocialService`] in its own submodule and is
//! built by [`create_service`] from its `[services.<name>]` config entry.
//! [`ServiceRegistry`] owns the resulting instances for the life of the
//! process.
//!
//! # Extension
//!
//! To add a platform, implement [`SocialService`] in a new submodule, add a
//! [`ServiceKind`] variant and wire it into [`create_service`].

pub mod log;
pub mod registry;
pub mod traits;
pub mod twitter;

pub use log::LogService;
pub use registry::{ServiceHandle, ServiceRegistry, UnknownService};
pub use traits::{ServiceError, SocialService};

use crate::config::{ServiceConfig, ServiceKind};
use std::sync::Arc;

const MAX_API_ERROR_CHARS: usize = 200;

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Scrub credential-looking tokens from text that is about to reach a chat channel.
///
/// Redacts `Bearer <token>` values and Slack/GitHub style prefixed tokens.
pub fn scrub_secret_patterns(input: &str) -> String {
    const PREFIXES: [&str; 5] = ["Bearer ", "xoxb-", "xoxp-", "ghp_", "github_pat_"];

    let mut scrubbed = input.to_string();

    for prefix in PREFIXES {
        let mut search_from = 0;
        while let Some(rel) = scrubbed[search_from..].find(prefix) {
            let start = search_from + rel;
            let content_start = start + prefix.len();
            let end = token_end(&scrubbed, content_start);

            if end == content_start {
                search_from = content_start;
                continue;
            }

            scrubbed.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    scrubbed
}

/// Scrub secrets from a remote error body and cap its length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input.trim());

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Turn a non-success HTTP response into a [`ServiceError::Api`].
pub async fn api_error(service: &str, response: reqwest::Response) -> ServiceError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    ServiceError::Api {
        service: service.to_string(),
        status,
        message: sanitize_api_error(&body),
    }
}

/// Factory: build the back end described by one config entry.
/// Build `builder`, or fall back to a default client when the configured one
/// cannot be built. The fallback loses the configured timeouts, so it is logged.
pub fn build_http_client(builder: reqwest::ClientBuilder, owner: &str) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(error) => {
            tracing::warn!(
                owner,
                "failed to build HTTP client with configured timeouts, falling back to defaults: {error}"
            );
            reqwest::Client::new()
        }
    }
}

pub fn create_service(name: &str, config: &ServiceConfig) -> anyhow::Result<Arc<dyn SocialService>> {
    match config.kind {
        ServiceKind::Twitter => {
            let service = twitter::TwitterService::from_config(name, config)?;
            Ok(Arc::new(service))
        }
        ServiceKind::Log => Ok(Arc::new(log::LogService::new(name))),
    }
}
