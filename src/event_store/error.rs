//! Event Store Errors
//!
//! Error types for event store operations.

use thiserror::Error;

/// Errors that can occur in the event store
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: the stream advanced since the
    /// aggregate was loaded. The caller must reload and retry or surface
    /// the conflict; the store never retries or merges.
    #[error(
        "Concurrency conflict on {stream_kind}/{aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        stream_kind: String,
        aggregate_id: String,
        expected: i64,
        actual: i64,
    },

    /// Unknown stream
    #[error("Stream not found: {stream_kind}/{aggregate_id}")]
    StreamNotFound {
        stream_kind: String,
        aggregate_id: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }

    /// Check if this error means the stream does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, EventStoreError::StreamNotFound { .. })
    }
}
