//! Adapts `jervis_memory::ItemStore` (C8) to the `IndexedItemSink` seam
//! `jervis_connectors`' poll algorithm (C7) talks through, so neither crate
//! depends on the other.

use std::sync::Arc;

use async_trait::async_trait;

use jervis_connectors::{IndexedItemSink, RemoteItem};
use jervis_core::ids::ConnectionId;
use jervis_memory::ItemStore;

/// Wraps an [`ItemStore`] handle behind the connector framework's sink contract.
pub struct ItemStoreSink {
    store: Arc<ItemStore>,
}

impl ItemStoreSink {
    /// Build a sink over a shared item store.
    #[must_use]
    pub fn new(store: Arc<ItemStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IndexedItemSink for ItemStoreSink {
    async fn exists(&self, connection_id: ConnectionId, remote_id: &str) -> jervis_connectors::Result<bool> {
        self.store
            .exists(connection_id, remote_id)
            .await
            .map_err(|e| jervis_connectors::Error::MalformedResponse(e.to_string()))
    }

    async fn insert_new(&self, connection_id: ConnectionId, item: &RemoteItem) -> jervis_connectors::Result<()> {
        self.store
            .insert_new(
                connection_id,
                &item.remote_id,
                item.capability,
                &item.title,
                &item.body,
                &item.attachments,
                item.parent_ref.as_deref(),
                item.updated_at,
            )
            .await
            .map_err(|e| jervis_connectors::Error::MalformedResponse(e.to_string()))
    }
}
