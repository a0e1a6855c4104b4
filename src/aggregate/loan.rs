//! Loan Aggregate
//!
//! Loan granting and amortization schedule generation. Monetary figures are
//! rounded to 2 decimals only at event emission; the schedule iteration
//! keeps full precision in between to limit compounding rounding error.

use rust_decimal::{Decimal, MathematicalOps};

use crate::domain::{round, Clock, DomainError, Installment, LoanEvent};

use super::{AggregateRoot, NEW_AGGREGATE_VERSION};

/// Longest supported term
const MAX_TERM_MONTHS: u32 = 360;

const MONTHS_PER_YEAR: u32 = 12;

/// Highest supported insurance rate (10% of principal over the term)
fn max_insurance_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanStatus {
    #[default]
    Active,
    Completed,
    Defaulted,
}

impl LoanStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Defaulted)
    }
}

/// Loan Aggregate
#[derive(Debug, Clone)]
pub struct Loan {
    id: String,
    borrower_id: String,
    principal: Decimal,
    currency: String,
    annual_rate: Decimal,
    term_months: u32,
    insurance_rate: Decimal,
    monthly_payment: Decimal,
    total_amount: Decimal,
    status: LoanStatus,
    schedule: Vec<Installment>,
    version: i64,
    pending: Vec<LoanEvent>,
}

impl Default for Loan {
    fn default() -> Self {
        Self {
            id: String::new(),
            borrower_id: String::new(),
            principal: Decimal::ZERO,
            currency: String::new(),
            annual_rate: Decimal::ZERO,
            term_months: 0,
            insurance_rate: Decimal::ZERO,
            monthly_payment: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            status: LoanStatus::Active,
            schedule: Vec::new(),
            version: NEW_AGGREGATE_VERSION,
            pending: Vec::new(),
        }
    }
}

impl Loan {
    /// Grant a loan and emit the granting event.
    ///
    /// The monthly payment follows the standard annuity formula
    /// `P * r / (1 - (1 + r)^-n)` with `r` the monthly rate, falling back
    /// to straight division for a zero rate. Insurance is a flat
    /// `principal * insurance_rate / term` per month.
    ///
    /// # Errors
    /// - `DomainError::Validation` if principal <= 0, annual rate < 0,
    ///   term is 0 or above 360 months, or insurance rate is outside
    ///   [0, 0.10]
    pub fn grant(
        id: impl Into<String>,
        borrower_id: impl Into<String>,
        principal: Decimal,
        currency: &str,
        annual_rate: Decimal,
        term_months: u32,
        insurance_rate: Decimal,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        if principal <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "principal must be positive (got {principal})"
            )));
        }
        if annual_rate < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "annual rate must not be negative (got {annual_rate})"
            )));
        }
        if term_months == 0 || term_months > MAX_TERM_MONTHS {
            return Err(DomainError::validation(format!(
                "term must be between 1 and {MAX_TERM_MONTHS} months (got {term_months})"
            )));
        }
        let max_insurance = max_insurance_rate();
        if insurance_rate < Decimal::ZERO || insurance_rate > max_insurance {
            return Err(DomainError::validation(format!(
                "insurance rate must be between 0 and {max_insurance} (got {insurance_rate})"
            )));
        }
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "currency must be a 3-letter code (got {currency:?})"
            )));
        }

        let payment_without_insurance =
            payment_without_insurance(principal, annual_rate, term_months)?;
        let monthly_insurance = principal * insurance_rate / Decimal::from(term_months);
        let monthly_payment = round(payment_without_insurance + monthly_insurance);
        let total_amount = round(monthly_payment * Decimal::from(term_months));

        let mut loan = Self::default();
        loan.apply(LoanEvent::LoanGranted {
            loan_id: id.into(),
            borrower_id: borrower_id.into(),
            principal: round(principal),
            currency: currency.to_ascii_uppercase(),
            annual_rate,
            term_months,
            insurance_rate,
            monthly_payment,
            total_amount,
            granted_at: clock.now(),
        });

        Ok(loan)
    }

    /// Generate the full amortization schedule and emit it as one event.
    ///
    /// Iterates the months tracking the remaining balance at full
    /// precision. The final installment's principal portion is clamped so
    /// the rounded principal portions sum exactly to the granted principal,
    /// absorbing the accumulated rounding residue.
    pub fn generate_schedule(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;
        if !self.schedule.is_empty() {
            return Err(DomainError::invariant("schedule has already been generated"));
        }

        let monthly_rate = self.annual_rate / Decimal::from(MONTHS_PER_YEAR);
        let payment = payment_without_insurance(self.principal, self.annual_rate, self.term_months)?;
        let monthly_insurance = round(
            self.principal * self.insurance_rate / Decimal::from(self.term_months),
        );

        let mut installments = Vec::with_capacity(self.term_months as usize);
        let mut remaining = self.principal;
        let mut principal_paid = Decimal::ZERO;

        for month in 1..=self.term_months {
            let interest = remaining * monthly_rate;

            let principal_portion = if month == self.term_months {
                // Absorb the rounding residue so portions sum to principal
                round(self.principal - principal_paid)
            } else {
                round(payment - interest)
            };
            principal_paid += principal_portion;
            remaining -= payment - interest;

            let remaining_balance = if month == self.term_months {
                Decimal::ZERO
            } else {
                round(remaining)
            };

            let interest = round(interest);
            installments.push(Installment {
                month,
                principal: principal_portion,
                interest,
                insurance: monthly_insurance,
                payment: principal_portion + interest + monthly_insurance,
                remaining_balance,
            });
        }

        self.apply(LoanEvent::ScheduleGenerated {
            loan_id: self.id.clone(),
            installments,
            generated_at: clock.now(),
        });
        Ok(())
    }

    /// Mark the loan fully repaid. Terminal.
    pub fn mark_completed(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.apply(LoanEvent::LoanCompleted {
            loan_id: self.id.clone(),
            completed_at: clock.now(),
        });
        Ok(())
    }

    /// Mark the loan defaulted. Terminal.
    pub fn mark_defaulted(&mut self, reason: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.apply(LoanEvent::LoanDefaulted {
            loan_id: self.id.clone(),
            reason: reason.to_string(),
            defaulted_at: clock.now(),
        });
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "loan {} is {:?} and accepts no further operations",
                self.id, self.status
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn borrower_id(&self) -> &str {
        &self.borrower_id
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn annual_rate(&self) -> Decimal {
        self.annual_rate
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn insurance_rate(&self) -> Decimal {
        self.insurance_rate
    }

    pub fn monthly_payment(&self) -> Decimal {
        self.monthly_payment
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn schedule(&self) -> &[Installment] {
        &self.schedule
    }
}

/// Monthly payment excluding insurance, at full precision.
fn payment_without_insurance(
    principal: Decimal,
    annual_rate: Decimal,
    term_months: u32,
) -> Result<Decimal, DomainError> {
    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let discount = (Decimal::ONE + monthly_rate)
        .checked_powi(-i64::from(term_months))
        .ok_or_else(|| DomainError::validation("rate/term combination overflows"))?;
    Ok(principal * monthly_rate / (Decimal::ONE - discount))
}

impl AggregateRoot for Loan {
    type Event = LoanEvent;

    fn aggregate_type() -> &'static str {
        "Loan"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }

    fn pending(&self) -> &[LoanEvent] {
        &self.pending
    }

    fn pending_mut(&mut self) -> &mut Vec<LoanEvent> {
        &mut self.pending
    }

    fn when(&mut self, event: &LoanEvent) {
        match event {
            LoanEvent::LoanGranted {
                loan_id,
                borrower_id,
                principal,
                currency,
                annual_rate,
                term_months,
                insurance_rate,
                monthly_payment,
                total_amount,
                ..
            } => {
                self.id = loan_id.clone();
                self.borrower_id = borrower_id.clone();
                self.principal = *principal;
                self.currency = currency.clone();
                self.annual_rate = *annual_rate;
                self.term_months = *term_months;
                self.insurance_rate = *insurance_rate;
                self.monthly_payment = *monthly_payment;
                self.total_amount = *total_amount;
                self.status = LoanStatus::Active;
            }

            LoanEvent::ScheduleGenerated { installments, .. } => {
                self.schedule = installments.clone();
            }

            LoanEvent::LoanCompleted { .. } => {
                self.status = LoanStatus::Completed;
            }

            LoanEvent::LoanDefaulted { .. } => {
                self.status = LoanStatus::Defaulted;
            }
        }
    }
}
