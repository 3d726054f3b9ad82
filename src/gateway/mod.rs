//! Slash-command webhook server.
//!
//! One `POST /slack/<route>` per [`Route`], each decoding the chat service's
//! form body into a [`CommandRequest`] and answering with the plain-text
//! dispatch outcome. Every answer is HTTP 200; the body carries the result.

pub mod handlers;

use crate::command::Route;
use crate::config::Config;
use crate::dispatch::{CommandDispatcher, CommandRequest};
use crate::notify::create_notifier;
use crate::services::ServiceRegistry;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
}

/// Hosts that only accept local connections.
pub fn is_loopback_host(host: &str) -> bool {
    matches!(host, "127.0.0.1" | "localhost" | "::1" | "[::1]")
}

/// Build the router with one command route per [`Route`] plus `/health`.
pub fn build_router(state: AppState, max_body_bytes: usize, request_timeout: Duration) -> Router {
    let mut router = Router::new().route("/health", get(handlers::handle_health));

    for route in Route::ALL {
        router = router.route(
            route.path(),
            post(
                move |state: State<AppState>, form: Result<Form<CommandRequest>, FormRejection>| {
                    handlers::handle_command(route, state, form)
                },
            ),
        );
    }

    router
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}

/// Wire the dispatcher from config: registry, notifier and route tokens.
pub fn build_dispatcher(config: &Config) -> Result<CommandDispatcher> {
    let registry = ServiceRegistry::from_config(&config.services)?;
    let notifier = create_notifier(&config.notifier);
    Ok(CommandDispatcher::new(
        Arc::new(registry),
        notifier,
        config.routes.clone(),
    )
    .with_config(&config.dispatch))
}

/// Run the webhook server until interrupted.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    if !is_loopback_host(host) && !config.gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host} - gateway would be exposed to the internet.\n\
             Put it behind a reverse proxy or tunnel, or set\n\
             [gateway] allow_public_bind = true in config.toml."
        );
    }

    let dispatcher = build_dispatcher(&config)?;
    if dispatcher.registry().is_empty() {
        anyhow::bail!(
            "No services configured. Add a [services.<name>] section to {}",
            config.config_path.display()
        );
    }

    for route in config.routes.disabled_routes() {
        tracing::warn!(
            route = %route,
            "no token configured; every request to {} will be rejected",
            route.path()
        );
    }

    let host = host.trim_start_matches('[').trim_end_matches(']');
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind gateway to {host}:{port}"))?;
    let local_addr: SocketAddr = listener.local_addr()?;
    let actual_port = local_addr.port();

    tracing::info!(
        host,
        port = actual_port,
        services = ?dispatcher.registry().names(),
        notifier = dispatcher.notifier().name(),
        "Gateway listening"
    );
    println!("🦀 socialhook gateway listening on http://{local_addr}");
    for route in Route::ALL {
        println!("  POST {}", route.path());
    }
    println!("  GET  /health");

    let state = AppState {
        dispatcher: Arc::new(dispatcher),
    };
    let app = build_router(
        state,
        config.gateway.max_body_bytes,
        Duration::from_secs(config.gateway.request_timeout_secs),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server failed")?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
