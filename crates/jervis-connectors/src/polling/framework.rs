//! Generic poll algorithm (§4.7): dispatch per capability, dedupe by natural
//! key, never let one bad item abort the whole run.

use tracing::{debug, warn};

use jervis_core::model::Connection;

use super::types::{ExternalSource, IndexedItemSink, ItemOutcome, PollingContext, PollingResult};

/// Run one poll of `connection` through `source`, recording discovered items
/// in `sink`. `context` is accepted for parity with the contract (callers
/// use it to project discovered items onto clients/projects downstream) but
/// the dedup/insert decision itself is per-connection, not per-client.
pub async fn poll_connection(
    source: &dyn ExternalSource,
    sink: &dyn IndexedItemSink,
    connection: &Connection,
    _context: &PollingContext,
) -> PollingResult {
    let mut outcomes = Vec::new();

    for &capability in source.capabilities() {
        if !connection.supports(capability) {
            continue;
        }

        let items = match source.fetch_items(connection, capability).await {
            Ok(items) => items,
            Err(e) => {
                warn!(connection_id = %connection.id, ?capability, error = %e, "sub-handler failed to enumerate items");
                outcomes.push(ItemOutcome::Errored);
                continue;
            }
        };

        for item in items {
            let outcome = match sink.exists(connection.id, &item.remote_id).await {
                Ok(true) => ItemOutcome::Skipped,
                Ok(false) => match sink.insert_new(connection.id, &item).await {
                    Ok(()) => ItemOutcome::Created,
                    Err(e) => {
                        warn!(connection_id = %connection.id, remote_id = %item.remote_id, error = %e, "failed to persist discovered item");
                        ItemOutcome::Errored
                    }
                },
                Err(e) => {
                    warn!(connection_id = %connection.id, remote_id = %item.remote_id, error = %e, "failed to check natural key");
                    ItemOutcome::Errored
                }
            };
            debug!(connection_id = %connection.id, remote_id = %item.remote_id, ?capability, "item processed");
            outcomes.push(outcome);
        }
    }

    PollingResult::tally(outcomes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use jervis_core::ids::ConnectionId;
    use jervis_core::model::{AuthConfig, Capability, ConnectionScope};

    use super::*;

    struct FixedSource {
        capabilities: Vec<Capability>,
        items: Vec<super::super::types::RemoteItem>,
    }

    #[async_trait]
    impl ExternalSource for FixedSource {
        fn capabilities(&self) -> &[Capability] {
            &self.capabilities
        }

        async fn fetch_items(
            &self,
            _connection: &Connection,
            _capability: Capability,
        ) -> crate::error::Result<Vec<super::super::types::RemoteItem>> {
            Ok(self.items.clone())
        }
    }

    #[derive(Default)]
    struct InMemorySink {
        seen: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl IndexedItemSink for InMemorySink {
        async fn exists(&self, _connection_id: ConnectionId, remote_id: &str) -> crate::error::Result<bool> {
            Ok(self.seen.lock().unwrap().contains(remote_id))
        }

        async fn insert_new(
            &self,
            _connection_id: ConnectionId,
            item: &super::super::types::RemoteItem,
        ) -> crate::error::Result<()> {
            self.seen.lock().unwrap().insert(item.remote_id.clone());
            Ok(())
        }
    }

    fn connection() -> Connection {
        Connection {
            id: ConnectionId::new(),
            scope: ConnectionScope::Client(jervis_core::ids::ClientId::new()),
            provider: jervis_core::model::ConnectionProvider::Gitlab,
            base_url: "https://gitlab.example.com".to_string(),
            auth: AuthConfig::None,
            timeout_ms: 5000,
            available_capabilities: [Capability::Repository].into_iter().collect(),
        }
    }

    fn item(remote_id: &str) -> super::super::types::RemoteItem {
        super::super::types::RemoteItem {
            remote_id: remote_id.to_string(),
            capability: Capability::Repository,
            title: "title".to_string(),
            body: "body".to_string(),
            attachments: Vec::new(),
            parent_ref: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn new_items_are_created_and_repeats_are_skipped() {
        let source = FixedSource {
            capabilities: vec![Capability::Repository],
            items: vec![item("c1"), item("c2")],
        };
        let sink = InMemorySink::default();
        let connection = connection();
        let context = PollingContext::default();

        let first = poll_connection(&source, &sink, &connection, &context).await;
        assert_eq!(first, PollingResult { discovered: 2, created: 2, skipped: 0, errors: 0 });

        let second = poll_connection(&source, &sink, &connection, &context).await;
        assert_eq!(second, PollingResult { discovered: 2, created: 0, skipped: 2, errors: 0 });
    }

    #[tokio::test]
    async fn unsupported_capability_is_never_dispatched() {
        let source = FixedSource {
            capabilities: vec![Capability::Mail],
            items: vec![item("m1")],
        };
        let sink = InMemorySink::default();
        let connection = connection();
        let context = PollingContext::default();

        let result = poll_connection(&source, &sink, &connection, &context).await;
        assert_eq!(result, PollingResult::default());
    }
}
