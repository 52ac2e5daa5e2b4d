//! Jervis - multi-tenant AI assistant orchestrator
//!
//! HTTP/WebSocket entry point: loads configuration, wires the planner,
//! executor, gateway and connector poll loop together, and serves the
//! task-submission and notification surfaces described in the external
//! interfaces section.

#![forbid(unsafe_code)]

mod api;
mod bootstrap;
mod config;
mod connectors;
mod item_sink;
mod prompts;
mod state;
mod telemetry;
mod websocket;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let _tracing_guard = telemetry::init();

    let app_config = AppConfig::load().context("failed to load configuration")?;
    let host = app_config.server.host.clone();
    let port = app_config.server.port;

    info!("starting jervis v{}", env!("CARGO_PKG_VERSION"));

    let state = bootstrap::bootstrap(app_config).await.context("failed to bootstrap application state")?;

    let app = axum::Router::new()
        .merge(api::router())
        .merge(websocket::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}").parse().context("invalid server bind address")?;
    let listener = tokio::net::TcpListener::bind(addr).await.context("failed to bind server socket")?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
