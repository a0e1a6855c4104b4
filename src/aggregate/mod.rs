//! Aggregate module
//!
//! Aggregate Root pattern for Event Sourcing. State is derived exclusively
//! by replaying the aggregate's own event stream; commands validate first
//! and only then emit events through the single `apply` entry point.

mod bank_account;
mod loan;
mod order;
mod user;

pub use bank_account::{AccountStatus, BankAccount};
pub use loan::{Loan, LoanStatus};
pub use order::{Order, OrderStatus};
pub use user::{User, UserStatus};

use crate::domain::DomainEvent;

/// Version of an aggregate with no events applied.
pub const NEW_AGGREGATE_VERSION: i64 = -1;

/// Contract every aggregate implements: identity, version, event
/// application and history replay.
///
/// `apply` and `load_from_history` drive the same per-aggregate state
/// transition (`when`); the only difference is that replayed events are not
/// re-buffered as uncommitted. Replaying a persisted history therefore
/// produces exactly the state and version the original `apply` calls
/// produced.
pub trait AggregateRoot: Default {
    /// The event type of this aggregate
    type Event: DomainEvent;

    /// Stream kind under which this aggregate's events are persisted
    fn aggregate_type() -> &'static str;

    /// Opaque aggregate id
    fn id(&self) -> &str;

    /// Current version: -1 before any event, then +1 per applied event
    fn version(&self) -> i64;

    /// State transition for a single event. Must be pure field mutation;
    /// it runs both on live application and on replay.
    fn when(&mut self, event: &Self::Event);

    /// Mutable access to the version counter, used by the provided methods
    fn version_mut(&mut self) -> &mut i64;

    /// Uncommitted events awaiting persistence
    fn pending(&self) -> &[Self::Event];

    /// Mutable access to the uncommitted buffer, used by the provided methods
    fn pending_mut(&mut self) -> &mut Vec<Self::Event>;

    /// Apply a freshly emitted event: transition state, bump the version
    /// and buffer the event for persistence.
    fn apply(&mut self, event: Self::Event) {
        self.when(&event);
        *self.version_mut() += 1;
        self.pending_mut().push(event);
    }

    /// Replay a previously persisted, ordered history without buffering.
    fn load_from_history<I>(&mut self, history: I)
    where
        I: IntoIterator<Item = Self::Event>,
    {
        for event in history {
            self.when(&event);
            *self.version_mut() += 1;
        }
    }

    /// Clear the uncommitted buffer after the store confirms a commit.
    fn mark_committed(&mut self) {
        self.pending_mut().clear();
    }

    /// Whether the aggregate holds events awaiting persistence.
    fn has_pending(&self) -> bool {
        !self.pending().is_empty()
    }
}
