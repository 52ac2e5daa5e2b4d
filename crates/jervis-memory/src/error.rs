//! Error types for indexed-item storage and hybrid retrieval.

/// Errors that can occur in memory/retrieval operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// SQLite database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization / deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hybrid store call failed (network, non-2xx, malformed response)
    #[error("hybrid store error: {0}")]
    HybridStore(String),

    /// LLM gateway call failed during synthesis
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// An `IndexedItem` transition was requested against a row in the wrong state
    #[error("invalid state transition on ({connection_id}, {remote_id}): {reason}")]
    InvalidTransition {
        /// Connection the item belongs to
        connection_id: String,
        /// Natural key within the connection
        remote_id: String,
        /// Why the transition was rejected
        reason: String,
    },

    /// General internal error
    #[error("{0}")]
    Internal(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
