use super::types::JervisEvent;
use tokio::sync::broadcast;

/// Broadcast-based event bus for real-time plan execution events (C12).
///
/// Uses `tokio::broadcast` so multiple subscribers can receive the same
/// events. Slow subscribers miss events (lagged) rather than blocking the
/// publisher — delivery to each subscriber is otherwise synchronous on the
/// publisher's own task, per the ordering guarantee in §5.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<JervisEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events. Returns a receiver that will get all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JervisEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all active subscribers.
    ///
    /// Returns the number of subscribers that received it. If there are no
    /// subscribers the event is silently dropped.
    pub fn publish(&self, event: JervisEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Current number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_events_reach_subscribers() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(JervisEvent::UserTaskCancelledEvent {
            context_id: crate::ids::ContextId::new(),
        });
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, JervisEvent::UserTaskCancelledEvent { .. }));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        let delivered = bus.publish(JervisEvent::UserTaskCancelledEvent {
            context_id: crate::ids::ContextId::new(),
        });
        assert_eq!(delivered, 0);
    }
}
