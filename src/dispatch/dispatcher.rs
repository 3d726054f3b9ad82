//! Per-request command pipeline.
//!
//! authenticate -> parse -> resolve service -> build action -> execute ->
//! notify. The first failing stage ends the request with its message; the
//! notifier only runs after a successful execution, on its own task, so it
//! can neither change nor delay the response.

use super::error::{DispatchError, DispatchOutcome};
use crate::action::Action;
use crate::command::{self, Route};
use crate::config::{DispatchConfig, RouteTokens};
use crate::notify::Notifier;
use crate::services::{ServiceError, ServiceRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Slash-command form fields as posted by the chat service.
///
/// Missing fields decode as empty strings. An empty `token` or `user_id`
/// fails authentication rather than the form extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandRequest {
    pub token: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub text: String,
}

pub struct CommandDispatcher {
    registry: Arc<ServiceRegistry>,
    notifier: Arc<dyn Notifier>,
    tokens: RouteTokens,
    execute_timeout: Duration,
    notify_timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        notifier: Arc<dyn Notifier>,
        tokens: RouteTokens,
    ) -> Self {
        Self {
            registry,
            notifier,
            tokens,
            execute_timeout: DEFAULT_EXECUTE_TIMEOUT,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, execute: Duration, notify: Duration) -> Self {
        self.execute_timeout = execute;
        self.notify_timeout = notify;
        self
    }

    pub fn with_config(self, config: &DispatchConfig) -> Self {
        self.with_timeouts(
            Duration::from_secs(config.execute_timeout_secs),
            Duration::from_secs(config.notify_timeout_secs),
        )
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Exact comparison against the route's configured token. A route with
    /// no token configured accepts nothing, and neither does a request that
    /// does not say who sent it.
    pub fn authenticate(&self, route: Route, request: &CommandRequest) -> Result<(), DispatchError> {
        let expected = self.tokens.token_for(route);
        if expected.is_empty() || expected != request.token {
            return Err(DispatchError::Unauthorized);
        }
        if request.user_id.trim().is_empty() {
            return Err(DispatchError::Unauthorized);
        }
        Ok(())
    }

    /// Parse the command text, resolve its service and build the action.
    pub fn prepare(&self, route: Route, text: &str, actor_id: &str) -> Result<Action, DispatchError> {
        let parsed = command::parse(route, text)?;
        let service = self.registry.resolve(&parsed.service)?;
        Ok(Action::from_command(parsed, service, actor_id))
    }

    /// Execute under the configured deadline.
    pub async fn execute(&self, action: &Action) -> Result<(), DispatchError> {
        match tokio::time::timeout(self.execute_timeout, action.execute()).await {
            Ok(result) => result.map_err(DispatchError::from),
            Err(_) => Err(ServiceError::Timeout {
                service: action.service().name().to_string(),
                secs: self.execute_timeout.as_secs(),
            }
            .into()),
        }
    }

    /// Best-effort notification on a detached task. Failures and timeouts
    /// are logged and dropped.
    fn notify(&self, action: Action) {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notify_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.notify(&action)).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => tracing::warn!(
                    notifier = notifier.name(),
                    kind = %action.kind(),
                    "notification failed: {error:#}"
                ),
                Err(_) => tracing::warn!(
                    notifier = notifier.name(),
                    kind = %action.kind(),
                    timeout_secs = timeout.as_secs(),
                    "notification timed out"
                ),
            }
        });
    }

    async fn run(&self, route: Route, request: &CommandRequest) -> Result<Action, DispatchError> {
        self.authenticate(route, request)?;
        let action = self.prepare(route, &request.text, &request.user_id)?;
        self.execute(&action).await?;
        Ok(action)
    }

    /// Handle one inbound command end to end.
    pub async fn dispatch(&self, route: Route, request: &CommandRequest) -> DispatchOutcome {
        match self.run(route, request).await {
            Ok(action) => {
                tracing::info!(
                    route = %route,
                    kind = %action.kind(),
                    service = action.service().name(),
                    user_id = %request.user_id,
                    user_name = request.user_name.as_deref().unwrap_or_default(),
                    "command executed"
                );
                self.notify(action);
                DispatchOutcome::Success
            }
            Err(error) => {
                tracing::warn!(
                    route = %route,
                    user_id = %request.user_id,
                    error_kind = error.kind(),
                    "command failed: {error}"
                );
                error.into()
            }
        }
    }
}
