//! In-memory event store
//!
//! Reference implementation of the `EventStore` contract: a map of streams
//! behind an async read-write lock. Used as the default store in tests and
//! wherever a durable engine is plugged in by the surrounding service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventStore, EventStoreError, RecordedEvent};

type StreamKey = (String, String);

/// In-memory `EventStore` implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<StreamKey, Vec<RecordedEvent>>>>,
}

impl InMemoryEventStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events across all streams.
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        stream_kind: &str,
        aggregate_id: &str,
        expected_version: i64,
        events: Vec<RecordedEvent>,
    ) -> Result<i64, EventStoreError> {
        let mut streams = self.streams.write().await;
        let stream = streams
            .entry((stream_kind.to_string(), aggregate_id.to_string()))
            .or_default();

        let current_version = stream.last().map_or(-1, |e| e.version);
        if current_version != expected_version {
            tracing::warn!(
                stream_kind,
                aggregate_id,
                expected = expected_version,
                actual = current_version,
                "optimistic concurrency conflict"
            );
            return Err(EventStoreError::ConcurrencyConflict {
                stream_kind: stream_kind.to_string(),
                aggregate_id: aggregate_id.to_string(),
                expected: expected_version,
                actual: current_version,
            });
        }

        let new_version = events.last().map_or(current_version, |e| e.version);
        stream.extend(events);
        Ok(new_version)
    }

    async fn read_stream(
        &self,
        stream_kind: &str,
        aggregate_id: &str,
    ) -> Result<Vec<RecordedEvent>, EventStoreError> {
        let streams = self.streams.read().await;
        match streams.get(&(stream_kind.to_string(), aggregate_id.to_string())) {
            Some(events) if !events.is_empty() => Ok(events.clone()),
            _ => Err(EventStoreError::StreamNotFound {
                stream_kind: stream_kind.to_string(),
                aggregate_id: aggregate_id.to_string(),
            }),
        }
    }

    async fn stream_version(
        &self,
        stream_kind: &str,
        aggregate_id: &str,
    ) -> Result<Option<i64>, EventStoreError> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(&(stream_kind.to_string(), aggregate_id.to_string()))
            .and_then(|events| events.last().map(|e| e.version)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn recorded(aggregate_id: &str, version: i64, event_type: &str) -> RecordedEvent {
        RecordedEvent {
            event_id: Uuid::new_v4(),
            stream_kind: "TestStream".to_string(),
            aggregate_id: aggregate_id.to_string(),
            version,
            event_type: event_type.to_string(),
            payload: serde_json::json!({"test": true}),
            occurred_on: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let store = InMemoryEventStore::new();

        let new_version = store
            .append(
                "TestStream",
                "agg-1",
                -1,
                vec![recorded("agg-1", 0, "Created"), recorded("agg-1", 1, "Updated")],
            )
            .await
            .unwrap();
        assert_eq!(new_version, 1);

        let events = store.read_stream("TestStream", "agg-1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "Created");
        assert_eq!(events[1].version, 1);
    }

    #[tokio::test]
    async fn test_concurrency_conflict() {
        let store = InMemoryEventStore::new();
        store
            .append("TestStream", "agg-1", -1, vec![recorded("agg-1", 0, "Created")])
            .await
            .unwrap();

        // Stale expected version
        let result = store
            .append("TestStream", "agg-1", -1, vec![recorded("agg-1", 0, "Updated")])
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict {
                expected: -1,
                actual: 0,
                ..
            })
        ));

        // Nothing was written
        let events = store.read_stream("TestStream", "agg-1").await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_append_with_correct_version_succeeds() {
        let store = InMemoryEventStore::new();
        store
            .append("TestStream", "agg-1", -1, vec![recorded("agg-1", 0, "Created")])
            .await
            .unwrap();

        let result = store
            .append("TestStream", "agg-1", 0, vec![recorded("agg-1", 1, "Updated")])
            .await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_stream_not_found() {
        let store = InMemoryEventStore::new();
        let result = store.read_stream("TestStream", "missing").await;
        assert!(matches!(result, Err(EventStoreError::StreamNotFound { .. })));
    }

    #[tokio::test]
    async fn test_streams_are_isolated_by_kind_and_id() {
        let store = InMemoryEventStore::new();
        store
            .append("KindA", "agg-1", -1, vec![recorded("agg-1", 0, "Created")])
            .await
            .unwrap();
        store
            .append("KindB", "agg-1", -1, vec![recorded("agg-1", 0, "Created")])
            .await
            .unwrap();

        assert_eq!(store.event_count().await, 2);
        assert_eq!(
            store.stream_version("KindA", "agg-1").await.unwrap(),
            Some(0)
        );
        assert_eq!(store.stream_version("KindA", "agg-2").await.unwrap(), None);
    }
}
