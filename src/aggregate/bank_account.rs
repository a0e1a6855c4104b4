//! BankAccount Aggregate
//!
//! Deposits, withdrawals, transfers, interest and lifecycle for a retail
//! bank account. Balance-changing events carry the resulting balance as a
//! snapshot, so replay applies it directly instead of recomputing.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    AccountEvent, AccountNumber, AccountType, Clock, DomainError, Money,
};

use super::{AggregateRoot, NEW_AGGREGATE_VERSION};

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    Open,
    Closed,
    Banned,
}

impl AccountStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Banned)
    }
}

/// BankAccount Aggregate
///
/// State is derived from events, never directly mutated by commands.
#[derive(Debug, Clone)]
pub struct BankAccount {
    id: String,
    user_id: String,
    account_number: Option<AccountNumber>,
    account_type: Option<AccountType>,
    balance: Option<Money>,
    name: Option<String>,
    status: AccountStatus,
    version: i64,
    pending: Vec<AccountEvent>,
}

impl Default for BankAccount {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            account_number: None,
            account_type: None,
            balance: None,
            name: None,
            status: AccountStatus::Open,
            version: NEW_AGGREGATE_VERSION,
            pending: Vec::new(),
        }
    }
}

impl BankAccount {
    /// Open a new account and emit the opening event.
    ///
    /// # Errors
    /// - `DomainError::Validation` if the initial deposit is negative or
    ///   the currency code is malformed
    pub fn open(
        id: impl Into<String>,
        user_id: impl Into<String>,
        account_number: AccountNumber,
        account_type: AccountType,
        initial_deposit: Decimal,
        currency: &str,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        let starting_balance = Money::new(initial_deposit, currency)?;
        let id = id.into();

        let mut account = Self::default();
        account.apply(AccountEvent::AccountOpened {
            account_id: id,
            user_id: user_id.into(),
            account_number,
            account_type,
            initial_deposit: starting_balance.amount(),
            currency: starting_balance.currency().to_string(),
            opened_at: clock.now(),
        });

        Ok(account)
    }

    /// Deposit money into the account.
    pub fn deposit(&mut self, amount: Money, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;
        let balance = self.require_balance()?;
        require_positive(&amount)?;
        let balance_after = balance.add(&amount)?;

        self.apply(AccountEvent::MoneyDeposited {
            account_id: self.id.clone(),
            amount: amount.amount(),
            currency: amount.currency().to_string(),
            balance_after: balance_after.amount(),
            deposited_at: clock.now(),
        });
        Ok(())
    }

    /// Withdraw money from the account.
    ///
    /// # Errors
    /// - `DomainError::InsufficientFunds` if the resulting balance would be
    ///   negative; no event is emitted
    pub fn withdraw(&mut self, amount: Money, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;
        let balance = self.require_balance()?;
        require_positive(&amount)?;
        let balance_after = balance.subtract(&amount)?;

        self.apply(AccountEvent::MoneyWithdrawn {
            account_id: self.id.clone(),
            amount: amount.amount(),
            currency: amount.currency().to_string(),
            balance_after: balance_after.amount(),
            withdrawn_at: clock.now(),
        });
        Ok(())
    }

    /// Send a transfer to another account.
    ///
    /// Only this side of the transfer is recorded here; the recipient
    /// aggregate commits its own `TransferReceived` independently.
    pub fn transfer_out(
        &mut self,
        recipient_account_id: &str,
        transfer_id: Uuid,
        amount: Money,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;
        let balance = self.require_balance()?;
        if recipient_account_id == self.id {
            return Err(DomainError::invariant("cannot transfer to the same account"));
        }
        require_positive(&amount)?;
        let balance_after = balance.subtract(&amount)?;

        self.apply(AccountEvent::TransferSent {
            account_id: self.id.clone(),
            recipient_account_id: recipient_account_id.to_string(),
            transfer_id,
            amount: amount.amount(),
            currency: amount.currency().to_string(),
            balance_after: balance_after.amount(),
            sent_at: clock.now(),
        });
        Ok(())
    }

    /// Receive a transfer from another account.
    pub fn transfer_in(
        &mut self,
        sender_account_id: &str,
        transfer_id: Uuid,
        amount: Money,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;
        let balance = self.require_balance()?;
        require_positive(&amount)?;
        let balance_after = balance.add(&amount)?;

        self.apply(AccountEvent::TransferReceived {
            account_id: self.id.clone(),
            sender_account_id: sender_account_id.to_string(),
            transfer_id,
            amount: amount.amount(),
            currency: amount.currency().to_string(),
            balance_after: balance_after.amount(),
            received_at: clock.now(),
        });
        Ok(())
    }

    /// Credit interest at the given rate: `interest = balance * rate`.
    pub fn apply_interest(&mut self, rate: Decimal, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;
        let balance = self.require_balance()?;
        let interest = balance.multiply(rate)?;
        let balance_after = balance.add(&interest)?;

        self.apply(AccountEvent::InterestApplied {
            account_id: self.id.clone(),
            rate,
            interest: interest.amount(),
            currency: interest.currency().to_string(),
            balance_after: balance_after.amount(),
            applied_at: clock.now(),
        });
        Ok(())
    }

    /// Change the display name.
    pub fn rename(&mut self, name: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;
        if name.trim().is_empty() {
            return Err(DomainError::validation("account name must not be empty"));
        }

        self.apply(AccountEvent::AccountRenamed {
            account_id: self.id.clone(),
            name: name.to_string(),
            renamed_at: clock.now(),
        });
        Ok(())
    }

    /// Close the account. Terminal; the stream stays readable for audit but
    /// rejects further commands.
    pub fn close(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.apply(AccountEvent::AccountClosed {
            account_id: self.id.clone(),
            closed_at: clock.now(),
        });
        Ok(())
    }

    /// Ban the account. Terminal.
    pub fn ban(&mut self, reason: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.apply(AccountEvent::AccountBanned {
            account_id: self.id.clone(),
            reason: reason.to_string(),
            banned_at: clock.now(),
        });
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "account {} is {:?} and accepts no further operations",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn require_balance(&self) -> Result<Money, DomainError> {
        self.balance
            .clone()
            .ok_or_else(|| DomainError::invariant("account has not been opened"))
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn account_number(&self) -> Option<&AccountNumber> {
        self.account_number.as_ref()
    }

    pub fn account_type(&self) -> Option<AccountType> {
        self.account_type
    }

    pub fn balance(&self) -> Option<&Money> {
        self.balance.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }
}

impl AggregateRoot for BankAccount {
    type Event = AccountEvent;

    fn aggregate_type() -> &'static str {
        "BankAccount"
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

    fn pending(&self) -> &[AccountEvent] {
        &self.pending
    }

    fn pending_mut(&mut self) -> &mut Vec<AccountEvent> {
        &mut self.pending
    }

    fn when(&mut self, event: &AccountEvent) {
        match event {
            AccountEvent::AccountOpened {
                account_id,
                user_id,
                account_number,
                account_type,
                initial_deposit,
                currency,
                ..
            } => {
                self.id = account_id.clone();
                self.user_id = user_id.clone();
                self.account_number = Some(account_number.clone());
                self.account_type = Some(*account_type);
                self.set_balance(*initial_deposit, currency);
                self.status = AccountStatus::Open;
            }

            AccountEvent::MoneyDeposited {
                balance_after,
                currency,
                ..
            }
            | AccountEvent::MoneyWithdrawn {
                balance_after,
                currency,
                ..
            }
            | AccountEvent::TransferSent {
                balance_after,
                currency,
                ..
            }
            | AccountEvent::TransferReceived {
                balance_after,
                currency,
                ..
            }
            | AccountEvent::InterestApplied {
                balance_after,
                currency,
                ..
            } => {
                self.set_balance(*balance_after, currency);
            }

            AccountEvent::AccountRenamed { name, .. } => {
                self.name = Some(name.clone());
            }

            AccountEvent::AccountClosed { .. } => {
                self.status = AccountStatus::Closed;
            }

            AccountEvent::AccountBanned { .. } => {
                self.status = AccountStatus::Banned;
            }
        }
    }
}

impl BankAccount {
    /// Install a balance snapshot from an event. Events are emitted by
    /// validated commands, so a malformed snapshot can only mean a corrupt
    /// stream; log and keep the current balance rather than poison replay.
    fn set_balance(&mut self, amount: Decimal, currency: &str) {
        match Money::new(amount, currency) {
            Ok(balance) => self.balance = Some(balance),
            Err(e) => {
                tracing::error!(
                    account_id = %self.id,
                    %amount,
                    currency,
                    "invalid balance snapshot in event: {e}"
                );
            }
        }
    }
}

fn require_positive(amount: &Money) -> Result<(), DomainError> {
    if amount.amount() <= Decimal::ZERO {
        return Err(DomainError::validation("amount must be positive"));
    }
    Ok(())
}
