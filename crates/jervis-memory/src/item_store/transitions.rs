use chrono::Utc;
use jervis_core::ids::ConnectionId;
use sqlx::Row;
use tracing::warn;

use super::{connection_id_to_text, ItemStore, INDEXING_TIMEOUT_SECS};
use crate::error::Result;

impl ItemStore {
    /// Atomically replace the `New`/`Indexing` document with a minimal
    /// `Indexed` shell keyed by the same natural key. Full payload fields
    /// are cleared — a wholesale replace, not a partial `status` write (see
    /// the DESIGN.md Open Question decision).
    ///
    /// `Indexed` is terminal: the state guard is folded into the `UPDATE`'s
    /// own `WHERE` clause, so a row already `Indexed` (or raced into some
    /// other state since the caller last observed it) is left untouched by
    /// the same statement that performs the transition, rather than by a
    /// separate check-then-act read.
    pub async fn mark_as_indexed(&self, connection_id: ConnectionId, remote_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE indexed_items
             SET state = 'indexed', title = '', body = '', attachments = '[]', parent_ref = NULL,
                 error = NULL, state_changed_at = ?3
             WHERE connection_id = ?1 AND remote_id = ?2 AND state != 'indexed'",
        )
        .bind(connection_id_to_text(connection_id))
        .bind(remote_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(%connection_id, remote_id, "mark_as_indexed affected no row; item missing or already indexed");
        }
        Ok(())
    }

    /// Write a `Failed` document preserving the full payload. If the item is
    /// already `Failed`, `reason` is appended to the existing error string
    /// with a `;` separator rather than overwriting it.
    pub async fn mark_as_failed(&self, connection_id: ConnectionId, remote_id: &str, reason: &str) -> Result<()> {
        let existing_error: Option<String> = sqlx::query(
            "SELECT error FROM indexed_items WHERE connection_id = ?1 AND remote_id = ?2 AND state = 'failed'",
        )
        .bind(connection_id_to_text(connection_id))
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row.try_get::<Option<String>, _>("error"))
        .transpose()?
        .flatten();

        let combined = match existing_error {
            Some(prev) if !prev.is_empty() => format!("{prev};{reason}"),
            _ => reason.to_string(),
        };

        sqlx::query(
            "UPDATE indexed_items SET state = 'failed', error = ?3, state_changed_at = ?4
             WHERE connection_id = ?1 AND remote_id = ?2 AND state != 'indexed'",
        )
        .bind(connection_id_to_text(connection_id))
        .bind(remote_id)
        .bind(combined)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Clear the error and rewrite a `Failed` item as `New` (retry).
    pub async fn reset_failed_to_new(&self, connection_id: ConnectionId, remote_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE indexed_items SET state = 'new', error = NULL, state_changed_at = ?3
             WHERE connection_id = ?1 AND remote_id = ?2 AND state = 'failed'",
        )
        .bind(connection_id_to_text(connection_id))
        .bind(remote_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Time out rows stuck in `Indexing` longer than [`INDEXING_TIMEOUT_SECS`]
    /// back to `New`. Returns the number of rows reclaimed.
    pub async fn reclaim_stale_indexing(&self) -> Result<u64> {
        let cutoff = (Utc::now() - chrono::Duration::seconds(INDEXING_TIMEOUT_SECS)).to_rfc3339();
        let result = sqlx::query(
            "UPDATE indexed_items SET state = 'new', state_changed_at = ?2
             WHERE state = 'indexing' AND state_changed_at < ?1",
        )
        .bind(&cutoff)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
