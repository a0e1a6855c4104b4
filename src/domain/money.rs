//! Money type
//!
//! Currency-safe fixed-precision monetary value. All amounts are validated
//! and rounded at construction time, so an invalid Money cannot exist in
//! the system. Every operation returns a new instance.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// Fixed precision of all monetary values (2 decimal places)
const SCALE: u32 = 2;

/// Money represents an amount in a specific currency.
///
/// # Invariants
/// - Amount is never negative
/// - Amount carries exactly 2 decimal places (round-half-up at creation)
/// - Currency is a 3-letter uppercase code
/// - Operations never cross currencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    /// Create a new Money value with validation.
    ///
    /// The amount is rounded half-up to 2 decimal places and the currency
    /// code is upper-cased.
    ///
    /// # Errors
    /// - `DomainError::Validation` if amount < 0 or the currency is not
    ///   exactly 3 letters
    pub fn new(amount: Decimal, currency: &str) -> Result<Self, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "amount must not be negative (got {amount})"
            )));
        }

        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "currency must be a 3-letter code (got {currency:?})"
            )));
        }

        Ok(Self {
            amount: round(amount),
            currency: currency.to_ascii_uppercase(),
        })
    }

    /// Zero in the given currency.
    ///
    /// The currency code is taken as-is (upper-cased, not validated); only
    /// used for blank aggregate state that a replayed event overwrites.
    pub fn zero(currency: &str) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency: currency.to_ascii_uppercase(),
        }
    }

    /// Get the amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Get the currency code.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Add another Money of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        self.require_same_currency(other)?;
        Money::new(self.amount + other.amount, &self.currency)
    }

    /// Subtract another Money of the same currency.
    ///
    /// # Errors
    /// - `DomainError::InsufficientFunds` if the result would be negative
    pub fn subtract(&self, other: &Money) -> Result<Money, DomainError> {
        self.require_same_currency(other)?;
        if other.amount > self.amount {
            return Err(DomainError::insufficient_funds(other.amount, self.amount));
        }
        Money::new(self.amount - other.amount, &self.currency)
    }

    /// Multiply by a non-negative factor, rounding the result.
    pub fn multiply(&self, factor: Decimal) -> Result<Money, DomainError> {
        if factor < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "multiplier must not be negative (got {factor})"
            )));
        }
        Money::new(self.amount * factor, &self.currency)
    }

    /// Divide by a positive divisor, rounding the result.
    pub fn divide(&self, divisor: Decimal) -> Result<Money, DomainError> {
        if divisor <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "divisor must be positive (got {divisor})"
            )));
        }
        Money::new(self.amount / divisor, &self.currency)
    }

    /// Check `self > other` (same currency required).
    pub fn gt(&self, other: &Money) -> Result<bool, DomainError> {
        self.require_same_currency(other)?;
        Ok(self.amount > other.amount)
    }

    /// Check `self >= other` (same currency required).
    pub fn gte(&self, other: &Money) -> Result<bool, DomainError> {
        self.require_same_currency(other)?;
        Ok(self.amount >= other.amount)
    }

    /// Check `self < other` (same currency required).
    pub fn lt(&self, other: &Money) -> Result<bool, DomainError> {
        self.require_same_currency(other)?;
        Ok(self.amount < other.amount)
    }

    /// Check `self <= other` (same currency required).
    pub fn lte(&self, other: &Money) -> Result<bool, DomainError> {
        self.require_same_currency(other)?;
        Ok(self.amount <= other.amount)
    }

    /// Check sufficiency for an outgoing amount.
    pub fn is_sufficient_for(&self, other: &Money) -> Result<bool, DomainError> {
        self.gte(other)
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency.clone(),
                found: other.currency.clone(),
            });
        }
        Ok(())
    }
}

/// Round a decimal to the fixed monetary precision, half-up.
pub(crate) fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}
