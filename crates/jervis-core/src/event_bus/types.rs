use serde::Serialize;

use crate::ids::{ContextId, DialogId, PlanId};
use crate::model::PlanStatus;

/// Events published during plan execution (C12).
///
/// Ids are carried as hex strings (via `Display`/`Serialize` on the id
/// newtypes) rather than raw byte arrays, so the WebSocket adapter can
/// serialize them directly for cross-process subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JervisEvent {
    /// A plan step finished, successfully or not
    StepCompletionEvent {
        /// Plan the step belongs to
        plan_id: PlanId,
        /// Step order within the plan
        step_order: u32,
        /// Tool that was invoked
        tool_name: String,
        /// Whether the step succeeded
        success: bool,
        /// Duration in milliseconds
        duration_ms: u64,
    },
    /// A plan transitioned between [`PlanStatus`] values
    PlanStatusChangeEvent {
        /// Plan that transitioned
        plan_id: PlanId,
        /// Status before the transition
        from: PlanStatus,
        /// Status after the transition
        to: PlanStatus,
    },
    /// A new user task (context) was created
    UserTaskCreatedEvent {
        /// Context created for the task
        context_id: ContextId,
        /// The task's original question
        question: String,
    },
    /// A user task was cancelled
    UserTaskCancelledEvent {
        /// Context whose running plans were cancelled
        context_id: ContextId,
    },
    /// The assistant produced a user-visible response
    AgentResponseEvent {
        /// Context the response belongs to
        context_id: ContextId,
        /// Plan that produced the response, if any
        plan_id: Option<PlanId>,
        /// Response text
        response: String,
    },
    /// A running tool is requesting out-of-band user input (C13)
    UserDialogRequestEvent {
        /// Id the user's answer must be correlated back with
        dialog_id: DialogId,
        /// Correlation id supplied by the requesting tool
        correlation_id: String,
        /// Question shown to the user
        question: String,
    },
    /// The user answered (or closed) a dialog request
    UserDialogResponseEvent {
        /// Dialog this answers
        dialog_id: DialogId,
        /// Correlation id echoed back
        correlation_id: String,
        /// The user's answer, empty if closed without answering
        answer: String,
        /// Whether the user accepted/provided an answer vs. dismissed it
        accepted: bool,
    },
}

impl JervisEvent {
    /// The plan this event concerns, if any.
    #[must_use]
    pub fn plan_id(&self) -> Option<PlanId> {
        match self {
            Self::StepCompletionEvent { plan_id, .. } | Self::PlanStatusChangeEvent { plan_id, .. } => {
                Some(*plan_id)
            }
            Self::AgentResponseEvent { plan_id, .. } => *plan_id,
            Self::UserTaskCreatedEvent { .. }
            | Self::UserTaskCancelledEvent { .. }
            | Self::UserDialogRequestEvent { .. }
            | Self::UserDialogResponseEvent { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_ids_as_hex_strings() {
        let event = JervisEvent::UserTaskCreatedEvent {
            context_id: ContextId::new(),
            question: "hi".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        let context_id = json["context_id"].as_str().unwrap();
        assert_eq!(context_id.len(), 24);
    }
}
