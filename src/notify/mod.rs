//! Chat notifications for completed actions.
//!
//! [`create_notifier`] picks the Slack webhook notifier when a webhook URL
//! is configured and falls back to [`LogNotifier`] otherwise.

pub mod log;
pub mod slack;
pub mod traits;

pub use log::LogNotifier;
pub use slack::SlackWebhookNotifier;
pub use traits::Notifier;

use crate::config::NotifierConfig;
use std::sync::Arc;
use std::time::Duration;

pub fn create_notifier(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match config
        .webhook_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        Some(url) => Arc::new(SlackWebhookNotifier::new(
            url,
            &config.channel,
            &config.username,
            Duration::from_secs(config.timeout_secs),
        )),
        None => Arc::new(LogNotifier),
    }
}
