use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One slash-command webhook endpoint.
///
/// Every route owns a grammar shape (the ordered fields its command text
/// is split into) and the format descriptor shown to the user when the
/// text does not fit that shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Make,
    MakeAttachments,
    Reply,
    ReplyAttachments,
    Delete,
    Share,
    Unshare,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Make,
        Route::MakeAttachments,
        Route::Reply,
        Route::ReplyAttachments,
        Route::Delete,
        Route::Share,
        Route::Unshare,
    ];

    /// Stable kebab-case name, also used in config keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Make => "make",
            Route::MakeAttachments => "make-attachments",
            Route::Reply => "reply",
            Route::ReplyAttachments => "reply-attachments",
            Route::Delete => "delete",
            Route::Share => "share",
            Route::Unshare => "unshare",
        }
    }

    /// HTTP path the gateway mounts this route on.
    pub fn path(self) -> &'static str {
        match self {
            Route::Make => "/slack/make",
            Route::MakeAttachments => "/slack/make-attachments",
            Route::Reply => "/slack/reply",
            Route::ReplyAttachments => "/slack/reply-attachments",
            Route::Delete => "/slack/delete",
            Route::Share => "/slack/share",
            Route::Unshare => "/slack/unshare",
        }
    }

    /// Expected command format, quoted back to the user on malformed input.
    pub fn format(self) -> &'static str {
        match self {
            Route::Make => "[service]: [content]",
            Route::MakeAttachments => "[service]: [attachment], ...; [content]",
            Route::Reply => "[service]: [url]; [content]",
            Route::ReplyAttachments => "[service]: [url]; [attachment], ...; [content]",
            Route::Delete | Route::Share | Route::Unshare => "[service]: [url]",
        }
    }

    pub fn takes_url(self) -> bool {
        !matches!(self, Route::Make | Route::MakeAttachments)
    }

    pub fn takes_attachments(self) -> bool {
        matches!(self, Route::MakeAttachments | Route::ReplyAttachments)
    }

    pub fn takes_content(self) -> bool {
        matches!(
            self,
            Route::Make | Route::MakeAttachments | Route::Reply | Route::ReplyAttachments
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('/').to_ascii_lowercase();
        Route::ALL
            .into_iter()
            .find(|route| route.as_str() == normalized || route.path()[1..] == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Route::ALL.iter().map(|r| r.as_str()).collect();
                anyhow::anyhow!("Unknown route `{s}`. Known routes: {}", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_paths_are_unique() {
        let mut paths: Vec<&str> = Route::ALL.iter().map(|r| r.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), Route::ALL.len());
    }

    #[test]
    fn route_parses_from_name_and_path() {
        assert_eq!("reply".parse::<Route>().unwrap(), Route::Reply);
        assert_eq!(
            "Make-Attachments".parse::<Route>().unwrap(),
            Route::MakeAttachments
        );
        assert_eq!("/slack/unshare".parse::<Route>().unwrap(), Route::Unshare);
    }

    #[test]
    fn unknown_route_lists_known_names() {
        let err = "retweet".parse::<Route>().unwrap_err().to_string();
        assert!(err.contains("retweet"));
        assert!(err.contains("make-attachments"));
    }

    #[test]
    fn share_and_unshare_use_the_delete_shape() {
        assert_eq!(Route::Share.format(), Route::Delete.format());
        assert_eq!(Route::Unshare.format(), Route::Delete.format());
        assert!(!Route::Share.takes_content());
    }

    #[test]
    fn route_serializes_kebab_case() {
        let json = serde_json::to_string(&Route::ReplyAttachments).unwrap();
        assert_eq!(json, "\"reply-attachments\"");
    }
}
