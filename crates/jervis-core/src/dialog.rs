//! Dialog Coordinator (C13)
//!
//! Lets a running tool suspend and await an out-of-band answer from the
//! user: the tool calls [`DialogCoordinator::request_dialog`], gets back a
//! [`DialogId`] and a future to await; a WebSocket handler elsewhere resolves
//! that dialog by id once the user responds (or closes it), and cancelling
//! the enclosing plan resolves every outstanding dialog it owns as
//! cancelled.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{oneshot, RwLock};

use crate::event_bus::{EventBus, JervisEvent};
use crate::ids::DialogId;

/// Outcome of an awaited dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// The user supplied an answer
    Answered(String),
    /// The user closed the dialog without answering
    Closed,
    /// The enclosing plan was cancelled while the dialog was outstanding
    Cancelled,
}

struct Waiting {
    tx: oneshot::Sender<DialogOutcome>,
    correlation_id: String,
}

/// Suspends plan steps awaiting user input, and resolves them when the
/// user's WebSocket response arrives.
#[derive(Default)]
pub struct DialogCoordinator {
    waiting: RwLock<HashMap<DialogId, Waiting>>,
}

impl DialogCoordinator {
    /// Create an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dialog and publish `UserDialogRequestEvent`. Returns the
    /// dialog id and a receiver the caller awaits for the outcome.
    pub async fn request_dialog(
        &self,
        correlation_id: impl Into<String>,
        question: impl Into<String>,
        event_bus: &EventBus,
    ) -> (DialogId, oneshot::Receiver<DialogOutcome>) {
        let dialog_id = DialogId::new();
        let correlation_id = correlation_id.into();
        let question = question.into();
        let (tx, rx) = oneshot::channel();

        self.waiting.write().await.insert(
            dialog_id,
            Waiting {
                tx,
                correlation_id: correlation_id.clone(),
            },
        );

        event_bus.publish(JervisEvent::UserDialogRequestEvent {
            dialog_id,
            correlation_id,
            question,
        });

        (dialog_id, rx)
    }

    /// Resolve a dialog with the user's answer (`UserDialogResponseEventDto`).
    /// Returns `true` if a waiter was found and resolved.
    pub async fn respond(&self, dialog_id: DialogId, answer: String, accepted: bool) -> bool {
        let Some(waiting) = self.waiting.write().await.remove(&dialog_id) else {
            return false;
        };
        let outcome = if accepted {
            DialogOutcome::Answered(answer)
        } else {
            DialogOutcome::Closed
        };
        let _ = waiting.tx.send(outcome);
        true
    }

    /// Close a dialog without an answer (`UserDialogCloseEventDto`).
    pub async fn close(&self, dialog_id: DialogId) -> bool {
        let Some(waiting) = self.waiting.write().await.remove(&dialog_id) else {
            return false;
        };
        let _ = waiting.tx.send(DialogOutcome::Closed);
        true
    }

    /// Resolve every outstanding dialog as cancelled, e.g. because the
    /// enclosing plan was cancelled.
    pub async fn cancel_all(&self) {
        let mut waiting = self.waiting.write().await;
        for (_, entry) in waiting.drain() {
            let _ = entry.tx.send(DialogOutcome::Cancelled);
        }
    }

    /// Correlation id a still-outstanding dialog was opened with, if any.
    pub async fn correlation_id_of(&self, dialog_id: DialogId) -> Option<String> {
        self.waiting
            .read()
            .await
            .get(&dialog_id)
            .map(|w| w.correlation_id.clone())
    }
}

/// Shared, cloneable handle to a [`DialogCoordinator`].
pub type SharedDialogCoordinator = Arc<DialogCoordinator>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn respond_resolves_the_waiter_with_the_answer() {
        let coordinator = DialogCoordinator::new();
        let bus = EventBus::new(8);
        let (dialog_id, rx) = coordinator.request_dialog("corr-1", "which env?", &bus).await;

        assert!(coordinator.respond(dialog_id, "prod".to_string(), true).await);
        assert_eq!(rx.await.unwrap(), DialogOutcome::Answered("prod".to_string()));
    }

    #[tokio::test]
    async fn close_resolves_without_an_answer() {
        let coordinator = DialogCoordinator::new();
        let bus = EventBus::new(8);
        let (dialog_id, rx) = coordinator.request_dialog("corr-2", "which env?", &bus).await;

        assert!(coordinator.close(dialog_id).await);
        assert_eq!(rx.await.unwrap(), DialogOutcome::Closed);
    }

    #[tokio::test]
    async fn cancel_all_resolves_every_outstanding_dialog() {
        let coordinator = DialogCoordinator::new();
        let bus = EventBus::new(8);
        let (_, rx1) = coordinator.request_dialog("a", "q1", &bus).await;
        let (_, rx2) = coordinator.request_dialog("b", "q2", &bus).await;

        coordinator.cancel_all().await;
        assert_eq!(rx1.await.unwrap(), DialogOutcome::Cancelled);
        assert_eq!(rx2.await.unwrap(), DialogOutcome::Cancelled);
    }

    #[tokio::test]
    async fn responding_to_unknown_dialog_returns_false() {
        let coordinator = DialogCoordinator::new();
        assert!(!coordinator.respond(DialogId::new(), "x".to_string(), true).await);
    }
}
