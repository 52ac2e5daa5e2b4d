use serde::{Deserialize, Serialize};

use crate::ids::{ClientId, ContextId, ProjectId};

/// User-facing envelope grouping one or more [`crate::model::Plan`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    /// Opaque id
    pub id: ContextId,
    /// Owning client
    pub client_id: ClientId,
    /// Bound project, if any
    pub project_id: Option<ProjectId>,
    /// Running summary of the conversation so far
    pub context_summary: String,
    /// Force fast/cheap model tier for every plan under this context
    pub quick: bool,
}

impl TaskContext {
    /// Start a fresh context with no summary yet.
    #[must_use]
    pub fn new(client_id: ClientId, project_id: Option<ProjectId>) -> Self {
        Self {
            id: ContextId::new(),
            client_id,
            project_id,
            context_summary: String::new(),
            quick: false,
        }
    }
}
