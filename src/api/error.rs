//! Uniform error-to-response mapping for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Wraps any error the handlers produce; renders as a JSON `{"error": ...}`
/// body with a status chosen from the underlying cause.
pub struct ApiError(pub anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<jervis_core::error::Error>() {
            Some(jervis_core::error::Error::ValidationFailure(_)) => StatusCode::BAD_REQUEST,
            Some(jervis_core::error::Error::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            Some(jervis_core::error::Error::TimedOut(_)) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
