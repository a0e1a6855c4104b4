//! Event Store module
//!
//! Persistence layer for Event Sourcing: append-only streams with
//! optimistic concurrency control.

mod error;
mod memory;
mod store;

pub use error::EventStoreError;
pub use memory::InMemoryEventStore;
pub use store::{EventStore, EventStoreExt, RecordedEvent};
