//! Command dispatch: the per-request state machine tying grammar, registry,
//! execution and notification together.

pub mod dispatcher;
pub mod error;

pub use dispatcher::{CommandDispatcher, CommandRequest};
pub use error::{DispatchError, DispatchOutcome, AUTH_FAILURE_BODY};
