use jervis_core::ids::ConnectionId;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ItemStore, POLL_DELAY_SECS};
use crate::error::Result;
use crate::types::{IndexedItem, ItemState};

/// A lazy, restartable, infinite sequence of `New` items ordered by
/// source-side `updated_at` descending (§4.8 `continuousNewItems`).
///
/// Each call to [`Self::next`] drains a buffered page; when the page is
/// exhausted it sleeps [`POLL_DELAY_SECS`] and re-queries. Cancelling the
/// token stops the sequence at the next yield boundary — not mid-sleep, so
/// a cancellation during the sleep is observed as soon as the sleep wakes.
pub struct ContinuousNewItems {
    store: ItemStore,
    page_size: u32,
    cancel: CancellationToken,
    buffer: Vec<IndexedItem>,
}

impl ContinuousNewItems {
    /// Build a continuous sequence over `store`, paginated at `page_size`.
    #[must_use]
    pub fn new(store: ItemStore, page_size: u32, cancel: CancellationToken) -> Self {
        Self { store, page_size, cancel, buffer: Vec::new() }
    }

    /// Yield the next `New` item, or `None` once cancelled.
    pub async fn next(&mut self) -> Option<IndexedItem> {
        loop {
            if let Some(item) = self.buffer.pop() {
                return Some(item);
            }
            if self.cancel.is_cancelled() {
                return None;
            }

            match self.store.fetch_new_page(self.page_size).await {
                Ok(page) if !page.is_empty() => {
                    // Reverse so pop() yields in the query's own (descending) order.
                    self.buffer = page.into_iter().rev().collect();
                    continue;
                }
                Ok(_) => {
                    debug!("continuous_new_items: page empty, sleeping");
                    tokio::select! {
                        () = tokio::time::sleep(std::time::Duration::from_secs(POLL_DELAY_SECS)) => {}
                        () = self.cancel.cancelled() => return None,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "continuous_new_items: page fetch failed, retrying after delay");
                    tokio::select! {
                        () = tokio::time::sleep(std::time::Duration::from_secs(POLL_DELAY_SECS)) => {}
                        () = self.cancel.cancelled() => return None,
                    }
                }
            }
        }
    }
}

impl ItemStore {
    pub(crate) async fn fetch_new_page(&self, limit: u32) -> Result<Vec<IndexedItem>> {
        let rows = sqlx::query(
            "SELECT connection_id, remote_id, capability, state, title, body, attachments, parent_ref, source_updated_at, error
             FROM indexed_items WHERE state = 'new' ORDER BY source_updated_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    /// All items for a connection in a given state, newest source-side
    /// update first — used by tests and diagnostics, not by the continuous
    /// sequence itself.
    pub async fn list_by_state(&self, connection_id: ConnectionId, state: ItemState) -> Result<Vec<IndexedItem>> {
        let rows = sqlx::query(
            "SELECT connection_id, remote_id, capability, state, title, body, attachments, parent_ref, source_updated_at, error
             FROM indexed_items WHERE connection_id = ?1 AND state = ?2 ORDER BY source_updated_at DESC",
        )
        .bind(super::connection_id_to_text(connection_id))
        .bind(state.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}
