use super::ItemStore;
use crate::error::Result;

impl ItemStore {
    pub(crate) async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS indexed_items (
                connection_id     TEXT NOT NULL,
                remote_id         TEXT NOT NULL,
                capability        TEXT NOT NULL,
                state             TEXT NOT NULL,
                title             TEXT NOT NULL DEFAULT '',
                body              TEXT NOT NULL DEFAULT '',
                attachments       TEXT NOT NULL DEFAULT '[]',
                parent_ref        TEXT,
                source_updated_at TEXT NOT NULL,
                error             TEXT,
                state_changed_at  TEXT NOT NULL,
                PRIMARY KEY (connection_id, remote_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_indexed_items_state
             ON indexed_items(connection_id, state, source_updated_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
