//! Domain Events
//!
//! Event definitions for all aggregates. Events are immutable facts; once
//! emitted they are never mutated. Each aggregate has a closed enum of its
//! event variants, each carrying only its relevant fields.
//!
//! Balance-changing account events carry the resulting balance as a
//! snapshot field, so replay and downstream projections never recompute
//! running totals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountNumber;

/// Common envelope every domain event exposes: which stream it belongs to,
/// its discriminator, and when it occurred.
pub trait DomainEvent: Clone + Serialize {
    /// Event type discriminator, stable across versions of the code.
    fn event_type(&self) -> &'static str;

    /// Id of the aggregate this event belongs to.
    fn aggregate_id(&self) -> &str;

    /// When the event occurred.
    fn occurred_on(&self) -> DateTime<Utc>;
}

/// Bank account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
}

/// Bank-account events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccountEvent {
    /// Account was opened with its starting balance
    AccountOpened {
        account_id: String,
        user_id: String,
        account_number: AccountNumber,
        account_type: AccountType,
        initial_deposit: Decimal,
        currency: String,
        opened_at: DateTime<Utc>,
    },

    /// Money was deposited (balance increased)
    MoneyDeposited {
        account_id: String,
        amount: Decimal,
        currency: String,
        balance_after: Decimal,
        deposited_at: DateTime<Utc>,
    },

    /// Money was withdrawn (balance decreased)
    MoneyWithdrawn {
        account_id: String,
        amount: Decimal,
        currency: String,
        balance_after: Decimal,
        withdrawn_at: DateTime<Utc>,
    },

    /// Outgoing transfer left this account
    TransferSent {
        account_id: String,
        recipient_account_id: String,
        transfer_id: Uuid,
        amount: Decimal,
        currency: String,
        balance_after: Decimal,
        sent_at: DateTime<Utc>,
    },

    /// Incoming transfer reached this account
    TransferReceived {
        account_id: String,
        sender_account_id: String,
        transfer_id: Uuid,
        amount: Decimal,
        currency: String,
        balance_after: Decimal,
        received_at: DateTime<Utc>,
    },

    /// Interest was credited
    InterestApplied {
        account_id: String,
        rate: Decimal,
        interest: Decimal,
        currency: String,
        balance_after: Decimal,
        applied_at: DateTime<Utc>,
    },

    /// Display name was changed
    AccountRenamed {
        account_id: String,
        name: String,
        renamed_at: DateTime<Utc>,
    },

    /// Account was closed (terminal)
    AccountClosed {
        account_id: String,
        closed_at: DateTime<Utc>,
    },

    /// Account was banned (terminal)
    AccountBanned {
        account_id: String,
        reason: String,
        banned_at: DateTime<Utc>,
    },
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountOpened { .. } => "AccountOpened",
            AccountEvent::MoneyDeposited { .. } => "MoneyDeposited",
            AccountEvent::MoneyWithdrawn { .. } => "MoneyWithdrawn",
            AccountEvent::TransferSent { .. } => "TransferSent",
            AccountEvent::TransferReceived { .. } => "TransferReceived",
            AccountEvent::InterestApplied { .. } => "InterestApplied",
            AccountEvent::AccountRenamed { .. } => "AccountRenamed",
            AccountEvent::AccountClosed { .. } => "AccountClosed",
            AccountEvent::AccountBanned { .. } => "AccountBanned",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            AccountEvent::AccountOpened { account_id, .. }
            | AccountEvent::MoneyDeposited { account_id, .. }
            | AccountEvent::MoneyWithdrawn { account_id, .. }
            | AccountEvent::TransferSent { account_id, .. }
            | AccountEvent::TransferReceived { account_id, .. }
            | AccountEvent::InterestApplied { account_id, .. }
            | AccountEvent::AccountRenamed { account_id, .. }
            | AccountEvent::AccountClosed { account_id, .. }
            | AccountEvent::AccountBanned { account_id, .. } => account_id,
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::AccountOpened { opened_at, .. } => *opened_at,
            AccountEvent::MoneyDeposited { deposited_at, .. } => *deposited_at,
            AccountEvent::MoneyWithdrawn { withdrawn_at, .. } => *withdrawn_at,
            AccountEvent::TransferSent { sent_at, .. } => *sent_at,
            AccountEvent::TransferReceived { received_at, .. } => *received_at,
            AccountEvent::InterestApplied { applied_at, .. } => *applied_at,
            AccountEvent::AccountRenamed { renamed_at, .. } => *renamed_at,
            AccountEvent::AccountClosed { closed_at, .. } => *closed_at,
            AccountEvent::AccountBanned { banned_at, .. } => *banned_at,
        }
    }
}

/// One row of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub month: u32,
    pub principal: Decimal,
    pub interest: Decimal,
    pub insurance: Decimal,
    pub payment: Decimal,
    pub remaining_balance: Decimal,
}

/// Loan events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoanEvent {
    /// Loan was granted
    LoanGranted {
        loan_id: String,
        borrower_id: String,
        principal: Decimal,
        currency: String,
        annual_rate: Decimal,
        term_months: u32,
        insurance_rate: Decimal,
        monthly_payment: Decimal,
        total_amount: Decimal,
        granted_at: DateTime<Utc>,
    },

    /// Full amortization schedule was generated
    ScheduleGenerated {
        loan_id: String,
        installments: Vec<Installment>,
        generated_at: DateTime<Utc>,
    },

    /// Loan was fully repaid (terminal)
    LoanCompleted {
        loan_id: String,
        completed_at: DateTime<Utc>,
    },

    /// Loan went into default (terminal)
    LoanDefaulted {
        loan_id: String,
        reason: String,
        defaulted_at: DateTime<Utc>,
    },
}

impl DomainEvent for LoanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LoanEvent::LoanGranted { .. } => "LoanGranted",
            LoanEvent::ScheduleGenerated { .. } => "ScheduleGenerated",
            LoanEvent::LoanCompleted { .. } => "LoanCompleted",
            LoanEvent::LoanDefaulted { .. } => "LoanDefaulted",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            LoanEvent::LoanGranted { loan_id, .. }
            | LoanEvent::ScheduleGenerated { loan_id, .. }
            | LoanEvent::LoanCompleted { loan_id, .. }
            | LoanEvent::LoanDefaulted { loan_id, .. } => loan_id,
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            LoanEvent::LoanGranted { granted_at, .. } => *granted_at,
            LoanEvent::ScheduleGenerated { generated_at, .. } => *generated_at,
            LoanEvent::LoanCompleted { completed_at, .. } => *completed_at,
            LoanEvent::LoanDefaulted { defaulted_at, .. } => *defaulted_at,
        }
    }
}

/// Changes made to a user profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none()
    }
}

/// User events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UserEvent {
    /// User registered
    UserRegistered {
        user_id: String,
        username: String,
        email: String,
        display_name: Option<String>,
        registered_at: DateTime<Utc>,
    },

    /// User profile was updated
    UserProfileUpdated {
        user_id: String,
        changes: UserChanges,
        updated_at: DateTime<Utc>,
    },

    /// User was deactivated (suspension, reversible)
    UserDeactivated {
        user_id: String,
        reason: Option<String>,
        deactivated_at: DateTime<Utc>,
    },

    /// User was reactivated
    UserReactivated {
        user_id: String,
        reactivated_at: DateTime<Utc>,
    },
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::UserRegistered { .. } => "UserRegistered",
            UserEvent::UserProfileUpdated { .. } => "UserProfileUpdated",
            UserEvent::UserDeactivated { .. } => "UserDeactivated",
            UserEvent::UserReactivated { .. } => "UserReactivated",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            UserEvent::UserRegistered { user_id, .. }
            | UserEvent::UserProfileUpdated { user_id, .. }
            | UserEvent::UserDeactivated { user_id, .. }
            | UserEvent::UserReactivated { user_id, .. } => user_id,
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            UserEvent::UserRegistered { registered_at, .. } => *registered_at,
            UserEvent::UserProfileUpdated { updated_at, .. } => *updated_at,
            UserEvent::UserDeactivated { deactivated_at, .. } => *deactivated_at,
            UserEvent::UserReactivated { reactivated_at, .. } => *reactivated_at,
        }
    }
}

/// Trading order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Trading-order events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderEvent {
    /// Order entered the book
    OrderPlaced {
        order_id: String,
        user_id: String,
        security_id: String,
        side: OrderSide,
        quantity: u64,
        price: Decimal,
        placed_at: DateTime<Utc>,
    },

    /// Order was cancelled (terminal)
    OrderCancelled {
        order_id: String,
        reason: String,
        cancelled_at: DateTime<Utc>,
    },

    /// A matching counter-order (partially) filled this order
    OrderExecuted {
        order_id: String,
        matched_order_id: String,
        executed_quantity: u64,
        executed_price: Decimal,
        fee: Decimal,
        executed_at: DateTime<Utc>,
    },
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced { .. } => "OrderPlaced",
            OrderEvent::OrderCancelled { .. } => "OrderCancelled",
            OrderEvent::OrderExecuted { .. } => "OrderExecuted",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            OrderEvent::OrderPlaced { order_id, .. }
            | OrderEvent::OrderCancelled { order_id, .. }
            | OrderEvent::OrderExecuted { order_id, .. } => order_id,
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced { placed_at, .. } => *placed_at,
            OrderEvent::OrderCancelled { cancelled_at, .. } => *cancelled_at,
            OrderEvent::OrderExecuted { executed_at, .. } => *executed_at,
        }
    }
}
