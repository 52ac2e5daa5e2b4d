//! Shared application state, handed to every axum handler through the
//! [`axum::extract::State`] extractor.

use std::sync::Arc;

use jervis_core::dialog::SharedDialogCoordinator;
use jervis_core::event_bus::EventBus;
use jervis_core::executor::PlanExecutor;
use jervis_core::memory::SessionStore;
use jervis_core::planner::Planner;
use jervis_llm::gateway::Gateway;
use jervis_memory::{HybridStore, ItemStore};

use crate::config::AppConfig;

/// Everything a request handler needs to drive a task end to end.
#[derive(Clone)]
pub struct AppState {
    /// LLM Gateway (C5)
    pub gateway: Arc<Gateway>,
    /// Two-phase planner (C9)
    pub planner: Arc<Planner>,
    /// Plan executor (C10)
    pub executor: Arc<PlanExecutor>,
    /// Notification bus (C12)
    pub event_bus: Arc<EventBus>,
    /// Dialog coordinator (C13)
    pub dialog: SharedDialogCoordinator,
    /// Indexed-item store (C8)
    pub item_store: Arc<ItemStore>,
    /// Hybrid search client (C6)
    pub hybrid_store: Arc<dyn HybridStore>,
    /// Conversation session storage
    pub sessions: Arc<dyn SessionStore>,
    /// Resolved configuration, kept around for handlers that need tunables
    pub config: Arc<AppConfig>,
}
