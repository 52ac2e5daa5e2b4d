//! Notification Bus (C12): in-process publish/subscribe for plan execution
//! events.
//!
//! Publishes events during execution so that WebSocket clients, REST SSE
//! endpoints, and internal subscribers (the dialog coordinator, metrics)
//! can receive real-time updates. The WebSocket adapter is responsible for
//! serializing [`JervisEvent`] to JSON and broadcasting on the
//! `NOTIFICATIONS` channel; that adapter lives outside this crate.

/// Core event bus implementation (broadcast channel).
pub mod bus;
/// Event type definitions for plan execution lifecycle.
pub mod types;

pub use bus::EventBus;
pub use types::JervisEvent;
