//! Slack incoming-webhook notifier.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::traits::Notifier;
use crate::action::Action;
use crate::services::{build_http_client, sanitize_api_error};

#[derive(Debug, Serialize, PartialEq, Eq)]
struct WebhookPayload<'a> {
    channel: &'a str,
    username: &'a str,
    text: String,
    icon_emoji: &'a str,
}

/// Posts the action summary to a Slack incoming webhook.
pub struct SlackWebhookNotifier {
    webhook_url: String,
    channel: String,
    username: String,
    client: Client,
}

impl SlackWebhookNotifier {
    pub fn new(webhook_url: &str, channel: &str, username: &str, timeout: Duration) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
            channel: channel.to_string(),
            username: username.to_string(),
            client: build_http_client(Client::builder().timeout(timeout), "slack-webhook"),
        }
    }

    fn payload<'a>(&'a self, action: &'a Action) -> WebhookPayload<'a> {
        WebhookPayload {
            channel: &self.channel,
            username: &self.username,
            text: action.chat_message(),
            icon_emoji: action.icon_emoji(),
        }
    }
}

#[async_trait]
impl Notifier for SlackWebhookNotifier {
    async fn notify(&self, action: &Action) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(action))
            .send()
            .await
            .context("Failed to reach Slack webhook")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Slack webhook returned {status}: {}",
                sanitize_api_error(&body)
            );
        }
        tracing::debug!(channel = %self.channel, kind = %action.kind(), "notification delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "slack"
    }
}
