//! Slash-command grammar.
//!
//! A [`Route`] names the webhook a command arrived on and fixes the order of
//! fields in its text; [`parse`] turns the raw text into a [`ParsedCommand`]
//! or reports which format was expected.

pub mod grammar;
pub mod route;

pub use grammar::{
    parse, split_attachments, split_service_name, split_url, MalformedCommand, MissingDelimiter,
    ParsedCommand,
};
pub use route::Route;
