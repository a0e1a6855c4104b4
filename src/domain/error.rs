//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent rejected command input and business invariant
/// failures. They are raised synchronously by aggregate operations, before
/// any event is emitted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Malformed command input, rejected before any event is produced
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Arithmetic or comparison between two different currencies
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },

    /// Balance would go negative
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Business invariant violation (terminal-state aggregate, parameter
    /// out of allowed range, illegal state transition)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create an insufficient funds error
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Check if this is a validation error (malformed input)
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an invariant violation (well-formed input that the
    /// current aggregate state rejects)
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::CurrencyMismatch { .. }
                | Self::InsufficientFunds { .. }
                | Self::InvariantViolation(_)
        )
    }
}
