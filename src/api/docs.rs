//! OpenAPI documentation - Swagger UI at `/docs`.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::chat::{ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use super::health::HealthResponse;
use crate::state::AppState;

/// Jervis API OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jervis API",
        version = "1.0.0",
        description = "Multi-tenant AI assistant backend: task submission, \
                        real-time notifications, and dialog resolution.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        crate::api::health::health_check,
        crate::api::chat::chat_completions,
    ),
    components(
        schemas(HealthResponse, ChatMessage, ChatCompletionRequest, ChatCompletionChoice, ChatCompletionResponse)
    ),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "chat", description = "Task submission"),
    )
)]
pub struct ApiDoc;

/// Mount Swagger UI and the raw OpenAPI JSON document.
pub fn router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()))
}
