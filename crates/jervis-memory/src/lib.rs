//! Jervis Memory — Indexing State Machine (C8) and RAG Pipeline (C6)
//!
//! `ItemStore` persists polled [`types::IndexedItem`]s through their
//! `New → Indexing → Indexed`/`Failed` lifecycle. `retrieval` fans a set of
//! queries out to an injected [`hybrid_store::HybridStore`], aggregates
//! deterministically, and synthesizes an answer through the gateway.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod hybrid_store;
pub mod item_store;
pub mod retrieval;
pub mod types;

pub use error::{Error, Result};
pub use hybrid_store::{HttpHybridStore, HybridStore};
pub use item_store::{ContinuousNewItems, ItemStore};
pub use retrieval::{execute_rag_pipeline, execute_raw_search};
pub use types::{DocumentChunk, HybridSearchContext, IndexedItem, ItemState};
