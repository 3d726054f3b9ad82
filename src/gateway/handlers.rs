//! axum handlers for the webhook routes.

use super::AppState;
use crate::command::Route;
use crate::dispatch::{CommandRequest, AUTH_FAILURE_BODY};
use axum::{
    extract::{rejection::FormRejection, Form, State},
    response::IntoResponse,
};

/// GET /health
pub async fn handle_health() -> &'static str {
    "ok"
}

/// POST /slack/<route>: dispatch one slash command.
///
/// The outcome body is returned as `text/plain` with status 200 whether the
/// command succeeded or not. A body that does not decode as a form cannot
/// carry a valid token and gets the auth-failure body.
pub async fn handle_command(
    route: Route,
    State(state): State<AppState>,
    form: Result<Form<CommandRequest>, FormRejection>,
) -> impl IntoResponse {
    let request = match form {
        Ok(Form(request)) => request,
        Err(rejection) => {
            tracing::warn!(
                route = %route,
                status = %rejection.status(),
                "rejected undecodable command body: {rejection}"
            );
            return AUTH_FAILURE_BODY.to_string();
        }
    };
    let outcome = state.dispatcher.dispatch(route, &request).await;
    outcome.body().to_string()
}
