use crate::command::MalformedCommand;
use crate::services::{ServiceError, UnknownService};
use thiserror::Error;

/// Fixed body returned when a request's token does not match its route.
pub const AUTH_FAILURE_BODY: &str = ":(";

/// Every way a command can fail. Each variant's `Display` is the exact
/// plain-text body returned to the chat user.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(":(")]
    Unauthorized,

    #[error(transparent)]
    Malformed(#[from] MalformedCommand),

    #[error(transparent)]
    UnknownService(#[from] UnknownService),

    #[error(transparent)]
    Execution(#[from] ServiceError),
}

impl DispatchError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Unauthorized => "unauthorized",
            DispatchError::Malformed(_) => "malformed_input",
            DispatchError::UnknownService(_) => "unknown_service",
            DispatchError::Execution(_) => "execution_failure",
        }
    }
}

/// Result of handling one command, as seen by the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success,
    Failure(String),
}

impl DispatchOutcome {
    /// Response body: empty on success, the failure message otherwise.
    pub fn body(&self) -> &str {
        match self {
            DispatchOutcome::Success => "",
            DispatchOutcome::Failure(message) => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success)
    }
}

impl From<DispatchError> for DispatchOutcome {
    fn from(error: DispatchError) -> Self {
        DispatchOutcome::Failure(error.to_string())
    }
}
