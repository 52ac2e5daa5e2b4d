//! HTTP surface: task submission plus a liveness probe.

pub mod chat;
pub mod docs;
pub mod error;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the REST router, mounted under the application's shared state.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/v1/chat/completions", post(chat::chat_completions))
        .merge(docs::router())
}
