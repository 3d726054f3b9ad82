//! X/Twitter back end over the v2 HTTP API.
//!
//! Authenticates with an OAuth 2.0 user access token (bearer). Retweets are
//! issued on behalf of the configured `user_id`, which must own the token.

use super::traits::{ServiceError, SocialService};
use super::{api_error, build_http_client};
use crate::config::ServiceConfig;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.twitter.com";

const TWEET_HOSTS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
    "x.com",
    "www.x.com",
];

#[derive(Debug, Serialize)]
struct CreateTweet<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplySettings<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Retweet<'a> {
    tweet_id: &'a str,
}

pub struct TwitterService {
    label: String,
    base_url: String,
    access_token: String,
    user_id: Option<String>,
    client: Client,
}

impl TwitterService {
    pub fn new(label: &str, base_url: &str, access_token: &str, timeout: Duration) -> Self {
        Self {
            label: label.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            user_id: None,
            client: build_http_client(
                Client::builder()
                    .timeout(timeout)
                    .connect_timeout(Duration::from_secs(10).min(timeout)),
                "twitter",
            ),
        }
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn from_config(label: &str, config: &ServiceConfig) -> anyhow::Result<Self> {
        let access_token = config
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .context("twitter services require `access_token`")?;
        let base_url = config.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let service = Self::new(
            label,
            base_url,
            access_token,
            Duration::from_secs(config.timeout_secs),
        );
        Ok(match config.user_id.as_deref() {
            Some(user_id) if !user_id.trim().is_empty() => service.with_user_id(user_id.trim()),
            _ => service,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn transport(&self, source: reqwest::Error) -> ServiceError {
        ServiceError::Transport {
            service: self.label.clone(),
            source,
        }
    }

    fn invalid_target(&self, url: &str) -> ServiceError {
        ServiceError::InvalidTarget {
            service: self.label.clone(),
            url: url.to_string(),
        }
    }

    fn not_found(&self, url: &str) -> ServiceError {
        ServiceError::NotFound {
            service: self.label.clone(),
            url: url.to_string(),
        }
    }

    /// Sharing needs the account's numeric id; surface its absence as a user-facing error.
    fn require_user_id(&self) -> Result<&str, ServiceError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ServiceError::Unsupported {
                service: self.label.clone(),
                reason: "sharing needs `user_id` in this service's config".into(),
            })
    }

    async fn post_tweet(&self, body: &CreateTweet<'_>) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url("/2/tweets"))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        if !response.status().is_success() {
            return Err(api_error(&self.label, response).await);
        }
        Ok(())
    }

    async fn expect_success(
        &self,
        response: reqwest::Response,
        target_url: &str,
    ) -> Result<(), ServiceError> {
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(self.not_found(target_url)),
            _ => Err(api_error(&self.label, response).await),
        }
    }
}

/// Tweet id from a status link such as `https://x.com/user/status/123?s=20`.
pub fn tweet_id_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_start_matches('<').trim_end_matches('>');
    let parsed = reqwest::Url::parse(trimmed).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if !TWEET_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let mut segments = parsed.path_segments()?;
    segments.find(|segment| *segment == "status" || *segment == "statuses")?;
    let id = segments.next()?;
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// Attachments are links; they ride along in the post body, one per line.
fn compose_text(content: &str, attachments: &[String]) -> String {
    let links: Vec<&str> = attachments
        .iter()
        .map(|a| a.as_str())
        .filter(|a| !a.is_empty())
        .collect();
    if links.is_empty() {
        content.to_string()
    } else {
        format!("{content}\n{}", links.join("\n"))
    }
}

#[async_trait]
impl SocialService for TwitterService {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn make(
        &self,
        actor_id: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError> {
        tracing::debug!(service = %self.label, actor = actor_id, "creating tweet");
        self.post_tweet(&CreateTweet {
            text: compose_text(content, attachments),
            reply: None,
        })
        .await
    }

    async fn reply(
        &self,
        actor_id: &str,
        target_url: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError> {
        let tweet_id = tweet_id_from_url(target_url).ok_or_else(|| self.invalid_target(target_url))?;
        tracing::debug!(service = %self.label, actor = actor_id, tweet_id = %tweet_id, "replying to tweet");
        self.post_tweet(&CreateTweet {
            text: compose_text(content, attachments),
            reply: Some(ReplySettings {
                in_reply_to_tweet_id: &tweet_id,
            }),
        })
        .await
    }

    async fn delete(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        let tweet_id = tweet_id_from_url(target_url).ok_or_else(|| self.invalid_target(target_url))?;
        tracing::debug!(service = %self.label, actor = actor_id, tweet_id = %tweet_id, "deleting tweet");
        let response = self
            .client
            .delete(self.url(&format!("/2/tweets/{tweet_id}")))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.expect_success(response, target_url).await
    }

    async fn share(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        let tweet_id = tweet_id_from_url(target_url).ok_or_else(|| self.invalid_target(target_url))?;
        let user_id = self.require_user_id()?;
        tracing::debug!(service = %self.label, actor = actor_id, tweet_id = %tweet_id, "retweeting");
        let response = self
            .client
            .post(self.url(&format!("/2/users/{user_id}/retweets")))
            .bearer_auth(&self.access_token)
            .json(&Retweet {
                tweet_id: &tweet_id,
            })
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.expect_success(response, target_url).await
    }

    async fn unshare(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        let tweet_id = tweet_id_from_url(target_url).ok_or_else(|| self.invalid_target(target_url))?;
        let user_id = self.require_user_id()?;
        tracing::debug!(service = %self.label, actor = actor_id, tweet_id = %tweet_id, "undoing retweet");
        let response = self
            .client
            .delete(self.url(&format!("/2/users/{user_id}/retweets/{tweet_id}")))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.expect_success(response, target_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const TWEET: &str = "https://twitter.com/someone/status/1234567890";

    fn service(server: &mockito::ServerGuard) -> TwitterService {
        TwitterService::new("twitter", &server.url(), "test-token", Duration::from_secs(5))
            .with_user_id("42")
    }

    #[test]
    fn tweet_id_from_status_links() {
        assert_eq!(tweet_id_from_url(TWEET).as_deref(), Some("1234567890"));
        assert_eq!(
            tweet_id_from_url("https://x.com/a/status/99?s=20").as_deref(),
            Some("99")
        );
        assert_eq!(
            tweet_id_from_url("<https://mobile.twitter.com/a/status/7/photo/1>").as_deref(),
            Some("7")
        );
    }

    #[test]
    fn tweet_id_rejects_foreign_or_malformed_links() {
        assert!(tweet_id_from_url("http://x/1").is_none());
        assert!(tweet_id_from_url("https://example.com/a/status/1").is_none());
        assert!(tweet_id_from_url("https://twitter.com/someone").is_none());
        assert!(tweet_id_from_url("https://twitter.com/a/status/abc").is_none());
        assert!(tweet_id_from_url("not a url").is_none());
    }

    #[test]
    fn compose_text_appends_attachment_links() {
        assert_eq!(compose_text("hi", &[]), "hi");
        assert_eq!(
            compose_text("hi", &["https://a/1.png".into(), "https://a/2.png".into()]),
            "hi\nhttps://a/1.png\nhttps://a/2.png"
        );
        assert_eq!(compose_text("hi", &[String::new()]), "hi");
    }

    #[test]
    fn from_config_requires_access_token() {
        let config = ServiceConfig {
            access_token: Some("  ".into()),
            ..ServiceConfig::default()
        };
        assert!(TwitterService::from_config("twitter", &config).is_err());
    }

    #[tokio::test]
    async fn make_posts_tweet_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2/tweets")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::Json(serde_json::json!({"text": "hello world"})))
            .with_status(201)
            .with_body(r#"{"data":{"id":"1","text":"hello world"}}"#)
            .create_async()
            .await;

        service(&server)
            .make("U1", "hello world", &[])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reply_sets_in_reply_to_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2/tweets")
            .match_body(Matcher::Json(serde_json::json!({
                "text": "thanks",
                "reply": {"in_reply_to_tweet_id": "1234567890"}
            })))
            .with_status(201)
            .create_async()
            .await;

        service(&server)
            .reply("U1", TWEET, "thanks", &[])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reply_to_non_tweet_link_is_invalid_target() {
        let server = mockito::Server::new_async().await;
        let err = service(&server)
            .reply("U1", "http://x/1", "thanks", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTarget { .. }));
        assert!(err.to_string().contains("http://x/1"));
    }

    #[tokio::test]
    async fn delete_missing_tweet_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/2/tweets/1234567890")
            .with_status(404)
            .create_async()
            .await;

        let err = service(&server).delete("U1", TWEET).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn share_and_unshare_hit_retweet_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let share = server
            .mock("POST", "/2/users/42/retweets")
            .match_body(Matcher::Json(serde_json::json!({"tweet_id": "1234567890"})))
            .with_status(200)
            .create_async()
            .await;
        let unshare = server
            .mock("DELETE", "/2/users/42/retweets/1234567890")
            .with_status(200)
            .create_async()
            .await;

        let twitter = service(&server);
        twitter.share("U1", TWEET).await.unwrap();
        twitter.unshare("U1", TWEET).await.unwrap();
        share.assert_async().await;
        unshare.assert_async().await;
    }

    #[tokio::test]
    async fn share_without_user_id_fails_before_request() {
        let server = mockito::Server::new_async().await;
        let twitter =
            TwitterService::new("twitter", &server.url(), "test-token", Duration::from_secs(5));
        let err = twitter.share("U1", TWEET).await.unwrap_err();
        assert!(err.to_string().contains("user_id"));
    }

    #[tokio::test]
    async fn api_rejection_carries_sanitized_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/2/tweets")
            .with_status(403)
            .with_body(r#"{"detail":"You are not allowed to create a Tweet with duplicate content."}"#)
            .create_async()
            .await;

        let err = service(&server).make("U1", "again", &[]).await.unwrap_err();
        match err {
            ServiceError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 403);
                assert!(message.contains("duplicate content"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
