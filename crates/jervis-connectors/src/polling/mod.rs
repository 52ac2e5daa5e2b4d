//! Polling Handler Framework (C7): turns a configured [`Connection`] into a
//! stream of discovered remote items, deduplicated by natural key and handed
//! off to whatever owns indexing-state persistence (C8, `jervis-memory`).

mod framework;
mod types;

pub use framework::poll_connection;
pub use types::{ExternalSource, IndexedItemSink, PollingContext, PollingResult, RemoteItem};
