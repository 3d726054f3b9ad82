//! Immutable, typed intent to perform one social media operation.
//!
//! Actions are built from already-parsed command fields and a resolved
//! [`ServiceHandle`]; construction never fails and performs no I/O. The
//! constructors are the only way to build one, so each kind always carries
//! exactly the fields it needs.

use crate::command::{ParsedCommand, Route};
use crate::services::{ServiceError, ServiceHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Make,
    Reply,
    Delete,
    Share,
    Unshare,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Make => "make",
            ActionKind::Reply => "reply",
            ActionKind::Delete => "delete",
            ActionKind::Share => "share",
            ActionKind::Unshare => "unshare",
        }
    }

    /// Emoji shown next to the chat notification for this kind.
    pub fn icon_emoji(self) -> &'static str {
        match self {
            ActionKind::Make => ":memo:",
            ActionKind::Reply => ":speech_balloon:",
            ActionKind::Delete => ":wastebasket:",
            ActionKind::Share => ":repeat:",
            ActionKind::Unshare => ":leftwards_arrow_with_hook:",
        }
    }
}

impl From<Route> for ActionKind {
    fn from(route: Route) -> Self {
        match route {
            Route::Make | Route::MakeAttachments => ActionKind::Make,
            Route::Reply | Route::ReplyAttachments => ActionKind::Reply,
            Route::Delete => ActionKind::Delete,
            Route::Share => ActionKind::Share,
            Route::Unshare => ActionKind::Unshare,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Action {
    kind: ActionKind,
    service: ServiceHandle,
    actor_id: String,
    content: String,
    attachments: Vec<String>,
    target_url: Option<String>,
    requested_at: DateTime<Utc>,
}

impl Action {
    fn build(
        kind: ActionKind,
        service: ServiceHandle,
        actor_id: &str,
        content: String,
        attachments: Vec<String>,
        target_url: Option<String>,
    ) -> Self {
        Self {
            kind,
            service,
            actor_id: actor_id.to_string(),
            content,
            attachments,
            target_url,
            requested_at: Utc::now(),
        }
    }

    pub fn make(
        service: ServiceHandle,
        actor_id: &str,
        content: impl Into<String>,
        attachments: Vec<String>,
    ) -> Self {
        Self::build(
            ActionKind::Make,
            service,
            actor_id,
            content.into(),
            attachments,
            None,
        )
    }

    pub fn reply(
        service: ServiceHandle,
        actor_id: &str,
        target_url: impl Into<String>,
        content: impl Into<String>,
        attachments: Vec<String>,
    ) -> Self {
        Self::build(
            ActionKind::Reply,
            service,
            actor_id,
            content.into(),
            attachments,
            Some(target_url.into()),
        )
    }

    pub fn delete(service: ServiceHandle, actor_id: &str, target_url: impl Into<String>) -> Self {
        Self::build(
            ActionKind::Delete,
            service,
            actor_id,
            String::new(),
            Vec::new(),
            Some(target_url.into()),
        )
    }

    pub fn share(service: ServiceHandle, actor_id: &str, target_url: impl Into<String>) -> Self {
        Self::build(
            ActionKind::Share,
            service,
            actor_id,
            String::new(),
            Vec::new(),
            Some(target_url.into()),
        )
    }

    pub fn unshare(service: ServiceHandle, actor_id: &str, target_url: impl Into<String>) -> Self {
        Self::build(
            ActionKind::Unshare,
            service,
            actor_id,
            String::new(),
            Vec::new(),
            Some(target_url.into()),
        )
    }

    /// Build the action a parsed command on its route asks for.
    pub fn from_command(command: ParsedCommand, service: ServiceHandle, actor_id: &str) -> Self {
        let target_url = command.target_url.unwrap_or_default();
        match ActionKind::from(command.route) {
            ActionKind::Make => Self::make(service, actor_id, command.content, command.attachments),
            ActionKind::Reply => Self::reply(
                service,
                actor_id,
                target_url,
                command.content,
                command.attachments,
            ),
            ActionKind::Delete => Self::delete(service, actor_id, target_url),
            ActionKind::Share => Self::share(service, actor_id, target_url),
            ActionKind::Unshare => Self::unshare(service, actor_id, target_url),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn service(&self) -> &ServiceHandle {
        &self.service
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attachments(&self) -> &[String] {
        &self.attachments
    }

    pub fn target_url(&self) -> Option<&str> {
        self.target_url.as_deref()
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn icon_emoji(&self) -> &'static str {
        self.kind.icon_emoji()
    }

    /// Run the action against its back end.
    pub async fn execute(&self) -> Result<(), ServiceError> {
        let service = self.service.service();
        let target = self.target_url.as_deref().unwrap_or_default();
        match self.kind {
            ActionKind::Make => {
                service
                    .make(&self.actor_id, &self.content, &self.attachments)
                    .await
            }
            ActionKind::Reply => {
                service
                    .reply(&self.actor_id, target, &self.content, &self.attachments)
                    .await
            }
            ActionKind::Delete => service.delete(&self.actor_id, target).await,
            ActionKind::Share => service.share(&self.actor_id, target).await,
            ActionKind::Unshare => service.unshare(&self.actor_id, target).await,
        }
    }

    /// Slack mrkdwn summary posted to the chat channel after success.
    pub fn chat_message(&self) -> String {
        let actor = format!("<@{}>", self.actor_id);
        let service = self.service.name();
        let target = self.target_url.as_deref().unwrap_or_default();

        let mut message = match self.kind {
            ActionKind::Make => format!("{actor} posted to *{service}*:\n{}", quote(&self.content)),
            ActionKind::Reply => format!(
                "{actor} replied to <{target}> on *{service}*:\n{}",
                quote(&self.content)
            ),
            ActionKind::Delete => format!("{actor} deleted <{target}> on *{service}*"),
            ActionKind::Share => format!("{actor} shared <{target}> on *{service}*"),
            ActionKind::Unshare => format!("{actor} unshared <{target}> on *{service}*"),
        };

        for attachment in &self.attachments {
            message.push_str("\nAttachment: ");
            message.push_str(attachment);
        }
        message
    }
}

fn quote(text: &str) -> String {
    if text.is_empty() {
        return ">".to_string();
    }
    text.lines()
        .map(|line| format!(">{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse;
    use crate::testing::{handle, Call, RecordingService};
    use std::sync::Arc;

    #[test]
    fn make_has_content_and_no_target() {
        let (_, service) = handle("twitter");
        let action = Action::make(service, "U1", "hello world", Vec::new());
        assert_eq!(action.kind(), ActionKind::Make);
        assert_eq!(action.content(), "hello world");
        assert!(action.attachments().is_empty());
        assert!(action.target_url().is_none());
        assert_eq!(action.service().name(), "twitter");
    }

    #[test]
    fn from_command_builds_reply_from_reply_route() {
        let (_, service) = handle("twitter");
        let command = parse(Route::Reply, "twitter: http://x/1; glad you liked it").unwrap();
        let action = Action::from_command(command, service, "U1");
        assert_eq!(action.kind(), ActionKind::Reply);
        assert_eq!(action.target_url(), Some("http://x/1"));
        assert_eq!(action.content(), "glad you liked it");
    }

    #[test]
    fn from_command_keeps_attachment_order() {
        let (_, service) = handle("twitter");
        let command =
            parse(Route::ReplyAttachments, "twitter: http://x/1; img1,img2; nice").unwrap();
        let action = Action::from_command(command, service, "U1");
        assert_eq!(action.attachments(), ["img1", "img2"]);
        assert_eq!(action.content(), "nice");
    }

    #[test]
    fn delete_share_unshare_carry_target_only() {
        let (_, service) = handle("twitter");
        for (route, kind) in [
            (Route::Delete, ActionKind::Delete),
            (Route::Share, ActionKind::Share),
            (Route::Unshare, ActionKind::Unshare),
        ] {
            let command = parse(route, "twitter: http://x/1").unwrap();
            let action = Action::from_command(command, service.clone(), "U1");
            assert_eq!(action.kind(), kind);
            assert_eq!(action.target_url(), Some("http://x/1"));
            assert!(action.content().is_empty());
        }
    }

    #[tokio::test]
    async fn execute_calls_matching_operation() {
        let (recorder, service) = handle("twitter");
        Action::reply(service.clone(), "U1", "http://x/1", "hi", vec!["a".into()])
            .execute()
            .await
            .unwrap();
        Action::unshare(service, "U1", "http://x/2")
            .execute()
            .await
            .unwrap();

        assert_eq!(
            recorder.calls(),
            vec![
                Call::Reply {
                    actor_id: "U1".into(),
                    target_url: "http://x/1".into(),
                    content: "hi".into(),
                    attachments: vec!["a".into()],
                },
                Call::Unshare {
                    actor_id: "U1".into(),
                    target_url: "http://x/2".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn execute_surfaces_service_error() {
        let recorder = Arc::new(RecordingService::failing("Could not find that tweet."));
        let service = ServiceHandle::new("twitter", recorder);
        let err = Action::delete(service, "U1", "http://x/1")
            .execute()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not find that tweet.");
    }

    #[test]
    fn chat_message_for_make_quotes_content_and_lists_attachments() {
        let (_, service) = handle("twitter");
        let action = Action::make(
            service,
            "U1",
            "hello world",
            vec!["https://a/1.png".into()],
        );
        assert_eq!(
            action.chat_message(),
            "<@U1> posted to *twitter*:\n>hello world\nAttachment: https://a/1.png"
        );
        assert_eq!(action.icon_emoji(), ":memo:");
    }

    #[test]
    fn chat_message_for_share_mentions_target() {
        let (_, service) = handle("twitter");
        let action = Action::share(service, "U1", "http://x/1");
        assert_eq!(action.chat_message(), "<@U1> shared <http://x/1> on *twitter*");
        assert_eq!(action.icon_emoji(), ":repeat:");
    }

    #[test]
    fn quote_prefixes_every_line() {
        assert_eq!(quote("a\nb"), ">a\n>b");
        assert_eq!(quote(""), ">");
    }
}
