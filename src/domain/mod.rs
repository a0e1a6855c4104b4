//! Domain module
//!
//! Value objects, domain events and domain errors. Everything here is pure
//! and infrastructure-free.

mod account_number;
mod clock;
mod error;
mod events;
mod money;

pub use account_number::{AccountNumber, AccountNumberGenerator};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::DomainError;
pub use events::{
    AccountEvent, AccountType, DomainEvent, Installment, LoanEvent, OrderEvent, OrderSide,
    UserChanges, UserEvent,
};
pub use money::Money;

pub(crate) use money::round;
