//! corebank
//!
//! Event-sourced retail-banking domain core: aggregates whose state is
//! derived exclusively by replaying ordered immutable domain events,
//! persisted through an append-only event store with optimistic
//! concurrency control.
//!
//! The crate is a library consumed by command-handler code; transport,
//! projections, authentication and notification fan-out live outside it.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod event_store;

pub use aggregate::{
    AccountStatus, AggregateRoot, BankAccount, Loan, LoanStatus, Order, OrderStatus, User,
    UserStatus,
};
pub use config::{Config, ConfigError};
pub use domain::{
    AccountEvent, AccountNumber, AccountNumberGenerator, AccountType, Clock, DomainError,
    DomainEvent, FixedClock, Installment, LoanEvent, Money, OrderEvent, OrderSide, SystemClock,
    UserChanges, UserEvent,
};
pub use event_store::{EventStore, EventStoreError, EventStoreExt, InMemoryEventStore, RecordedEvent};
