//! Core data types for the indexing state machine (C8) and RAG pipeline (C6).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use jervis_core::ids::ConnectionId;
use jervis_core::model::Capability;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an [`IndexedItem`] (§3 "IndexedItem").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Discovered, full payload present, not yet indexed
    New,
    /// Claimed by an indexing worker; must time out back to `New`
    Indexing,
    /// Indexed; only the tracking tuple remains, payload discarded
    Indexed,
    /// Indexing failed; full payload retained for retry
    Failed,
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Indexing => "indexing",
            Self::Indexed => "indexed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl ItemState {
    /// Parse a state string persisted by [`Self::fmt`]. Unknown values fall
    /// back to `New` rather than panicking — a corrupt state column should
    /// re-drive the item through indexing, not crash the poller.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "indexing" => Self::Indexing,
            "indexed" => Self::Indexed,
            "failed" => Self::Failed,
            _ => Self::New,
        }
    }
}

/// One polymorphic indexed item (a `ConfluencePage`, `JiraIssue`, `GitCommit`,
/// `EmailMessage`, …), keyed by `(connection_id, remote_id)`.
///
/// `New`/`Failed` carry the full payload; `Indexed` carries only the
/// tracking tuple — callers reading an `Indexed` row should expect `title`/
/// `body`/`attachments`/`parent_ref` to be empty, not meaningfully present.
#[derive(Debug, Clone)]
pub struct IndexedItem {
    /// Connection this item was discovered through
    pub connection_id: ConnectionId,
    /// Provider-side id; `(connection_id, remote_id)` is the natural key
    pub remote_id: String,
    /// Capability this item was discovered under
    pub capability: Capability,
    /// Current lifecycle state
    pub state: ItemState,
    /// Item title (issue summary, page title, commit subject, mail subject)
    pub title: String,
    /// Full body/content; absent once `Indexed`
    pub body: String,
    /// Attachment references, opaque to this crate
    pub attachments: Vec<String>,
    /// Parent reference (e.g. a wiki page's parent page), if any
    pub parent_ref: Option<String>,
    /// Provider-reported last-modified timestamp
    pub source_updated_at: DateTime<Utc>,
    /// Accumulated failure reasons, `;`-joined; only meaningful when `Failed`
    pub error: Option<String>,
}

/// A scored chunk returned by the hybrid store (§6 "Vector store").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Relevance score, already filtered server-side against `min_score`
    pub score: f32,
    /// Chunk content
    pub content: String,
    /// Opaque provider metadata (source, natural key, …)
    pub metadata: HashMap<String, String>,
}

/// Filters derived from the owning plan's client/project binding, passed to
/// every `hybridSearch` call.
#[derive(Debug, Clone)]
pub struct HybridSearchContext {
    /// Tenant scope
    pub client_id: jervis_core::ids::ClientId,
    /// Optional project scope
    pub project_id: Option<jervis_core::ids::ProjectId>,
    /// Max chunks to return, applied server-side
    pub limit: u32,
    /// Minimum score cutoff, applied server-side
    pub min_score: f32,
    /// Weight between keyword and vector sub-scores, 0.0 (pure keyword) to
    /// 1.0 (pure vector); 0.75 default
    pub hybrid_alpha: f32,
}

impl HybridSearchContext {
    /// The spec's default `hybridAlpha` weight.
    pub const DEFAULT_HYBRID_ALPHA: f32 = 0.75;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_state_roundtrips_through_its_string_form() {
        for state in [ItemState::New, ItemState::Indexing, ItemState::Indexed, ItemState::Failed] {
            assert_eq!(ItemState::from_str_lossy(&state.to_string()), state);
        }
    }

    #[test]
    fn unknown_state_string_falls_back_to_new() {
        assert_eq!(ItemState::from_str_lossy("garbage"), ItemState::New);
    }
}
