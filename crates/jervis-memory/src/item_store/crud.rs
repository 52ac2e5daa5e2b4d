use chrono::{DateTime, Utc};
use jervis_core::ids::ConnectionId;
use jervis_core::model::Capability;
use sqlx::Row;

use super::{connection_id_to_text, ItemStore};
use crate::error::{Error, Result};
use crate::types::{IndexedItem, ItemState};

pub(crate) fn capability_to_text(capability: Capability) -> String {
    match serde_json::to_value(capability) {
        Ok(serde_json::Value::String(s)) => s,
        _ => unreachable!("Capability always serializes to a string"),
    }
}

pub(crate) fn capability_from_text(s: &str) -> Result<Capability> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(Error::Serialization)
}

impl ItemStore {
    /// True if `(connection_id, remote_id)` already exists in any state.
    pub async fn exists(&self, connection_id: ConnectionId, remote_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM indexed_items WHERE connection_id = ?1 AND remote_id = ?2")
            .bind(connection_id_to_text(connection_id))
            .bind(remote_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Insert a freshly discovered item as `New`. No-op if the natural key
    /// already exists — callers are expected to check [`Self::exists`] first
    /// per the poll algorithm (§4.7), so this only guards against races.
    pub async fn insert_new(
        &self,
        connection_id: ConnectionId,
        remote_id: &str,
        capability: Capability,
        title: &str,
        body: &str,
        attachments: &[String],
        parent_ref: Option<&str>,
        source_updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let attachments_json = serde_json::to_string(attachments)?;
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT OR IGNORE INTO indexed_items
             (connection_id, remote_id, capability, state, title, body, attachments, parent_ref, source_updated_at, error, state_changed_at)
             VALUES (?1, ?2, ?3, 'new', ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
        )
        .bind(connection_id_to_text(connection_id))
        .bind(remote_id)
        .bind(capability_to_text(capability))
        .bind(title)
        .bind(body)
        .bind(attachments_json)
        .bind(parent_ref)
        .bind(source_updated_at.to_rfc3339())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch one item by its natural key.
    pub async fn get(&self, connection_id: ConnectionId, remote_id: &str) -> Result<Option<IndexedItem>> {
        let row = sqlx::query(
            "SELECT connection_id, remote_id, capability, state, title, body, attachments, parent_ref, source_updated_at, error
             FROM indexed_items WHERE connection_id = ?1 AND remote_id = ?2",
        )
        .bind(connection_id_to_text(connection_id))
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    pub(crate) fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<IndexedItem> {
        let capability: String = row.try_get("capability")?;
        let state: String = row.try_get("state")?;
        let attachments: String = row.try_get("attachments")?;
        let source_updated_at: String = row.try_get("source_updated_at")?;
        let connection_id: String = row.try_get("connection_id")?;

        Ok(IndexedItem {
            connection_id: ConnectionId(
                jervis_core::ids::ObjectId::from_hex(&connection_id)
                    .map_err(|_| Error::Internal("corrupt connection_id column".into()))?,
            ),
            remote_id: row.try_get("remote_id")?,
            capability: capability_from_text(&capability)?,
            state: ItemState::from_str_lossy(&state),
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            attachments: serde_json::from_str(&attachments)?,
            parent_ref: row.try_get("parent_ref")?,
            source_updated_at: DateTime::parse_from_rfc3339(&source_updated_at)
                .map_err(|e| Error::Internal(format!("corrupt source_updated_at: {e}")))?
                .with_timezone(&Utc),
            error: row.try_get("error")?,
        })
    }
}
