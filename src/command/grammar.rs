//! Delimiter grammar for slash-command text.
//!
//! Each stage splits the remaining text on the first occurrence of its
//! delimiter, yields the trimmed left side as a field and hands the
//! untouched right side to the next stage. The first stage that cannot
//! find its delimiter fails the whole parse with the route's format.

use serde::Serialize;
use thiserror::Error;

use super::route::Route;

const SERVICE_DELIMITER: char = ':';
const FIELD_DELIMITER: char = ';';
const ATTACHMENT_SEPARATOR: char = ',';

/// Fields extracted from one command. Only the fields the route's shape
/// names are populated; the rest stay empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    pub route: Route,
    pub service: String,
    pub target_url: Option<String>,
    pub attachments: Vec<String>,
    pub content: String,
}

/// The command text did not match the route's grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Sorry, I couldn't understand that. Expected format: `{}`", .route.format())]
pub struct MalformedCommand {
    pub route: Route,
}

impl MalformedCommand {
    pub fn format(&self) -> &'static str {
        self.route.format()
    }
}

/// A single stage failed to find its delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingDelimiter(pub char);

fn split_once_trimmed(text: &str, delimiter: char) -> Result<(&str, &str), MissingDelimiter> {
    text.split_once(delimiter)
        .map(|(field, rest)| (field.trim(), rest))
        .ok_or(MissingDelimiter(delimiter))
}

/// `service: rest`, split on the first `:`.
pub fn split_service_name(text: &str) -> Result<(&str, &str), MissingDelimiter> {
    split_once_trimmed(text, SERVICE_DELIMITER)
}

/// `url; rest`, split on the first `;`.
pub fn split_url(text: &str) -> Result<(&str, &str), MissingDelimiter> {
    split_once_trimmed(text, FIELD_DELIMITER)
}

/// `a, b, c; rest`, split on the first `;` and then the left side on `,`.
///
/// An empty left side yields one empty attachment, not an empty list.
pub fn split_attachments(text: &str) -> Result<(Vec<String>, &str), MissingDelimiter> {
    let (list, rest) = split_once_trimmed(text, FIELD_DELIMITER)?;
    let attachments = list
        .split(ATTACHMENT_SEPARATOR)
        .map(|piece| piece.trim().to_string())
        .collect();
    Ok((attachments, rest))
}

/// The final remainder becomes post content. Only the whitespace that
/// separates it from the preceding delimiter is dropped.
fn content_from(rest: &str) -> String {
    rest.trim_start().to_string()
}

/// Run `route`'s grammar over `text`.
pub fn parse(route: Route, text: &str) -> Result<ParsedCommand, MalformedCommand> {
    let malformed = |_: MissingDelimiter| MalformedCommand { route };

    let (service, rest) = split_service_name(text).map_err(malformed)?;
    let mut parsed = ParsedCommand {
        route,
        service: service.to_string(),
        target_url: None,
        attachments: Vec::new(),
        content: String::new(),
    };

    match route {
        Route::Make => {
            parsed.content = content_from(rest);
        }
        Route::MakeAttachments => {
            let (attachments, rest) = split_attachments(rest).map_err(malformed)?;
            parsed.attachments = attachments;
            parsed.content = content_from(rest);
        }
        Route::Reply => {
            let (url, rest) = split_url(rest).map_err(malformed)?;
            parsed.target_url = Some(url.to_string());
            parsed.content = content_from(rest);
        }
        Route::ReplyAttachments => {
            let (url, rest) = split_url(rest).map_err(malformed)?;
            let (attachments, rest) = split_attachments(rest).map_err(malformed)?;
            parsed.target_url = Some(url.to_string());
            parsed.attachments = attachments;
            parsed.content = content_from(rest);
        }
        Route::Delete | Route::Share | Route::Unshare => {
            parsed.target_url = Some(rest.trim().to_string());
        }
    }

    Ok(parsed)
}
