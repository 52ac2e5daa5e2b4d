//! Types shared by every provider's polling handler.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jervis_core::ids::{ClientId, ConnectionId, ProjectId};
use jervis_core::model::{Capability, Connection};

use crate::error::Result;

/// One remote item enumerated by a provider, not yet known to be NEW/seen.
#[derive(Debug, Clone)]
pub struct RemoteItem {
    /// Provider-side id, combined with the connection id to form the natural key
    pub remote_id: String,
    /// Capability this item was discovered under
    pub capability: Capability,
    /// Item title (issue summary, page title, commit subject, mail subject)
    pub title: String,
    /// Full body/content
    pub body: String,
    /// Attachment references, opaque to the framework
    pub attachments: Vec<String>,
    /// Parent reference (e.g. a wiki page's parent page), if any
    pub parent_ref: Option<String>,
    /// Provider-reported last-modified timestamp
    pub updated_at: DateTime<Utc>,
}

/// Lists all clients that inherit a connection and all projects that have
/// attached it explicitly.
#[derive(Debug, Clone, Default)]
pub struct PollingContext {
    /// Explicit per-client project attachment; `None` means "inherit on
    /// every project of that client"
    client_projects: HashMap<ClientId, Option<ProjectId>>,
}

impl PollingContext {
    /// Build a context from explicit client → project attachments.
    #[must_use]
    pub fn new(client_projects: HashMap<ClientId, Option<ProjectId>>) -> Self {
        Self { client_projects }
    }

    /// The explicit project attachment for `client_id`, if any; `None` means
    /// inherit on every project of that client. Panics in neither case — a
    /// client absent from the context simply has no attachment to report.
    #[must_use]
    pub fn get_project_id(&self, client_id: ClientId) -> Option<ProjectId> {
        self.client_projects.get(&client_id).copied().flatten()
    }

    /// All clients this connection is visible to.
    pub fn client_ids(&self) -> impl Iterator<Item = &ClientId> {
        self.client_projects.keys()
    }
}

/// Outcome of one `poll()` run against a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollingResult {
    /// Total remote items enumerated this run
    pub discovered: u32,
    /// Items newly inserted as NEW `IndexedItem`s
    pub created: u32,
    /// Items whose natural key already existed in a terminal state
    pub skipped: u32,
    /// Individual item failures that did not abort the sub-handler
    pub errors: u32,
}

impl PollingResult {
    fn record(&mut self, outcome: ItemOutcome) {
        self.discovered += 1;
        match outcome {
            ItemOutcome::Created => self.created += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Errored => self.errors += 1,
        }
    }
}

pub(crate) enum ItemOutcome {
    Created,
    Skipped,
    Errored,
}

impl PollingResult {
    pub(crate) fn tally(results: impl IntoIterator<Item = ItemOutcome>) -> Self {
        let mut tally = Self::default();
        for outcome in results {
            tally.record(outcome);
        }
        tally
    }
}

/// Per-provider contract: enumerate remote items for one capability of a
/// connection, paginated and bounded internally per run.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    /// Capabilities this source knows how to enumerate.
    fn capabilities(&self) -> &[Capability];

    /// Fetch the next bounded page of items for `capability`, newest-first.
    /// Implementations own their own pagination state/cursor.
    async fn fetch_items(&self, connection: &Connection, capability: Capability) -> Result<Vec<RemoteItem>>;
}

/// Where discovered items are persisted (C8, owned by `jervis-memory`).
/// Kept as a trait here so this crate never depends on the indexing crate.
#[async_trait]
pub trait IndexedItemSink: Send + Sync {
    /// True if `(connection_id, remote_id)` already exists in a terminal state.
    async fn exists(&self, connection_id: ConnectionId, remote_id: &str) -> Result<bool>;

    /// Insert a freshly discovered item as NEW.
    async fn insert_new(&self, connection_id: ConnectionId, item: &RemoteItem) -> Result<()>;
}
