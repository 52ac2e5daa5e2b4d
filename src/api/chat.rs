//! Chat-completion-shaped task submission endpoint (§6 "external interfaces"):
//! accepts an OpenAI-chat-completions-style request, drives it through the
//! planner (C9) and executor (C10), and returns the synthesized answer in
//! the same shape.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use jervis_core::event_bus::JervisEvent;
use jervis_core::ids::{ClientId, ObjectId, ProjectId};
use jervis_core::memory::SessionContext;
use jervis_core::model::TaskContext;
use jervis_llm::message::MessageRole;

use crate::api::error::ApiError;
use crate::state::AppState;

/// One message in the conversation, OpenAI's `{role, content}` shape.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChatMessage {
    /// `"system"`, `"user"`, or `"assistant"`
    pub role: String,
    /// Message text
    pub content: String,
}

/// Request body for task submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    /// Conversation so far; the last `user` message is the task's question
    pub messages: Vec<ChatMessage>,
    /// Owning client, as a 24-character hex object id; a fresh one is
    /// minted when absent
    #[serde(default)]
    pub client_id: Option<String>,
    /// Bound project, as a 24-character hex object id
    #[serde(default)]
    pub project_id: Option<String>,
    /// Session key conversation history is persisted under; defaults to the
    /// client id when absent, so a client without explicit session
    /// management still gets continuity across requests
    #[serde(default)]
    pub session_key: Option<String>,
    /// Force the fast/cheap model tier for this task
    #[serde(default)]
    pub quick: bool,
}

/// One synthesized choice, mirroring `chat.completion.choices[0]`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatCompletionChoice {
    index: u32,
    message: ChatMessage,
    finish_reason: &'static str,
}

/// Response body, OpenAI chat-completion-shaped.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatCompletionResponse {
    id: String,
    object: &'static str,
    model: &'static str,
    choices: Vec<ChatCompletionChoice>,
}

fn parse_object_id<T>(hex: &str, wrap: impl Fn(ObjectId) -> T) -> Result<T, ApiError> {
    ObjectId::from_hex(hex)
        .map(wrap)
        .map_err(|_| ApiError(anyhow::anyhow!("invalid hex object id: {hex}")))
}

/// Submit a task: persist the turn into the session, plan it, execute it,
/// and return the finalized answer.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "chat",
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "Task completed", body = ChatCompletionResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn chat_completions(
    State(state): State<AppState>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, ApiError> {
    let question = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.clone())
        .ok_or_else(|| ApiError(anyhow::anyhow!("no user message in request")))?;

    let client_id = match &request.client_id {
        Some(hex) => parse_object_id(hex, ClientId)?,
        None => ClientId::new(),
    };
    let project_id = match &request.project_id {
        Some(hex) => Some(parse_object_id(hex, ProjectId)?),
        None => None,
    };

    let session_key = request
        .session_key
        .clone()
        .unwrap_or_else(|| SessionContext::make_key("http", "chat", &client_id.to_string()));

    let mut session = state
        .sessions
        .get(&session_key)
        .await?
        .unwrap_or_else(|| SessionContext::new(session_key.clone()));
    session.add_user_message(question.clone());

    let context_summary = session
        .get_messages()
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut task_context = TaskContext::new(client_id, project_id);
    task_context.context_summary = context_summary;
    task_context.quick = request.quick;

    state.event_bus.publish(JervisEvent::UserTaskCreatedEvent {
        context_id: task_context.id,
        question: question.clone(),
    });

    let correlation_id = task_context.id.to_string();

    let plan = state
        .planner
        .plan_task(&task_context, question.clone(), question.clone(), &correlation_id)
        .await?;

    let plan = state
        .executor
        .execute_plan(plan, &task_context, &correlation_id)
        .await?;

    let answer = plan
        .final_answer
        .clone()
        .ok_or_else(|| ApiError(anyhow::anyhow!("plan did not reach a finalized answer")))?;

    session.add_assistant_message(answer.clone());
    state.sessions.save(&session).await?;

    Ok(Json(ChatCompletionResponse {
        id: plan.id.to_string(),
        object: "chat.completion",
        model: "jervis",
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: ChatMessage {
                role: MessageRole::Assistant.as_str().to_string(),
                content: answer,
            },
            finish_reason: "stop",
        }],
    }))
}
