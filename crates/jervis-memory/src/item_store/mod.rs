//! `ItemStore` — SQLite persistence and CAS transitions for the indexing
//! state machine (C8).

use jervis_core::ids::ConnectionId;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::{Error, Result};

mod continuous;
mod crud;
mod migrations;
mod transitions;

#[cfg(test)]
mod tests;

pub use continuous::ContinuousNewItems;

/// Rows in `Indexing` longer than this are treated as stale and eligible to
/// time out back to `New` on the next `reclaim_stale_indexing` sweep.
pub const INDEXING_TIMEOUT_SECS: i64 = 300;

/// Default delay between exhausted-page polls of `continuous_new_items`.
pub const POLL_DELAY_SECS: u64 = 30;

/// SQLite-backed repository over the `indexed_items` table.
#[derive(Clone)]
pub struct ItemStore {
    pub(crate) pool: SqlitePool,
}

impl ItemStore {
    /// Open (or create) an item store at the given path.
    pub async fn from_path(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Internal(format!("mkdir: {e}")))?;
        }
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new().max_connections(5).connect(&url).await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("item store initialized at {}", db_path.display());
        Ok(store)
    }

    /// In-memory store (for tests).
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.run_migrations().await?;
        debug!("in-memory item store initialized");
        Ok(store)
    }
}

pub(crate) fn connection_id_to_text(id: ConnectionId) -> String {
    id.0.to_hex()
}
