//! Event Store contract
//!
//! Append-only per-stream persistence with optimistic concurrency control.
//! A stream is keyed by `(stream_kind, aggregate_id)`; appends are
//! all-or-nothing and conditioned on the stream's current tail version.
//!
//! The store is pluggable: command handlers program against the
//! `EventStore` trait, and `EventStoreExt` adds the aggregate-level
//! save/load operations on top of it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::domain::DomainEvent;

use super::EventStoreError;

/// A durably recorded event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_id: Uuid,
    pub stream_kind: String,
    pub aggregate_id: String,
    /// Position in the stream; the first event of a stream is version 0
    pub version: i64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub occurred_on: DateTime<Utc>,
}

/// Append-only event persistence.
///
/// Implementations must be thread-safe; concurrent appends to the same
/// stream are serialized by the expected-version check, not by locks held
/// across command execution.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a batch of events to one stream, all-or-nothing.
    ///
    /// `expected_version` is the stream tail the caller observed when it
    /// loaded the aggregate (-1 for a new stream). If the durable tail
    /// differs, the append fails with `ConcurrencyConflict` and writes
    /// nothing.
    ///
    /// Returns the new tail version.
    async fn append(
        &self,
        stream_kind: &str,
        aggregate_id: &str,
        expected_version: i64,
        events: Vec<RecordedEvent>,
    ) -> Result<i64, EventStoreError>;

    /// Read the full ordered event history of a stream.
    ///
    /// Fails with `StreamNotFound` for an unknown stream.
    async fn read_stream(
        &self,
        stream_kind: &str,
        aggregate_id: &str,
    ) -> Result<Vec<RecordedEvent>, EventStoreError>;

    /// Current tail version of a stream, or `None` if it does not exist.
    async fn stream_version(
        &self,
        stream_kind: &str,
        aggregate_id: &str,
    ) -> Result<Option<i64>, EventStoreError>;
}

/// Aggregate-level persistence operations on top of any `EventStore`.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Persist an aggregate's uncommitted events.
    ///
    /// The append is conditioned on the version the aggregate held before
    /// this batch of events was applied. On success the uncommitted buffer
    /// is cleared; on conflict nothing is written and the buffer is kept so
    /// the caller can reload and retry. Saving an aggregate with no pending
    /// events is a no-op.
    async fn save_aggregate<A>(&self, aggregate: &mut A) -> Result<(), EventStoreError>
    where
        A: AggregateRoot + Send,
        A::Event: Sync,
    {
        if !aggregate.has_pending() {
            return Ok(());
        }

        let stream_kind = A::aggregate_type();
        let aggregate_id = aggregate.id().to_string();
        let expected_version = aggregate.version() - aggregate.pending().len() as i64;

        let mut events = Vec::with_capacity(aggregate.pending().len());
        for (offset, event) in aggregate.pending().iter().enumerate() {
            events.push(RecordedEvent {
                event_id: Uuid::new_v4(),
                stream_kind: stream_kind.to_string(),
                aggregate_id: aggregate_id.clone(),
                version: expected_version + 1 + offset as i64,
                event_type: event.event_type().to_string(),
                payload: serde_json::to_value(event)?,
                occurred_on: event.occurred_on(),
            });
        }

        let new_version = self
            .append(stream_kind, &aggregate_id, expected_version, events)
            .await?;
        aggregate.mark_committed();

        tracing::debug!(
            stream_kind,
            aggregate_id = %aggregate_id,
            version = new_version,
            "events committed"
        );
        Ok(())
    }

    /// Load an aggregate by replaying its full event history.
    async fn load_aggregate<A>(&self, aggregate_id: &str) -> Result<A, EventStoreError>
    where
        A: AggregateRoot + Send,
        A::Event: DeserializeOwned,
    {
        let recorded = self.read_stream(A::aggregate_type(), aggregate_id).await?;

        let mut history = Vec::with_capacity(recorded.len());
        for event in recorded {
            history.push(serde_json::from_value::<A::Event>(event.payload)?);
        }

        let mut aggregate = A::default();
        aggregate.load_from_history(history);

        tracing::debug!(
            stream_kind = A::aggregate_type(),
            aggregate_id,
            version = aggregate.version(),
            "aggregate hydrated"
        );
        Ok(aggregate)
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}
