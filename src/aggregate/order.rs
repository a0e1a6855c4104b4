//! Order Aggregate
//!
//! Trading order lifecycle. Matching itself happens in an external
//! collaborator that applies fills by price-time priority; this aggregate
//! only enforces the order's own contract: fill bookkeeping, status
//! transitions and terminal states.

use rust_decimal::Decimal;

use crate::domain::{Clock, DomainError, OrderEvent, OrderSide};

use super::{AggregateRoot, NEW_AGGREGATE_VERSION};

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    PartiallyFilled,
    Executed,
    Cancelled,
}

impl OrderStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Executed | Self::Cancelled)
    }
}

/// Order Aggregate
#[derive(Debug, Clone)]
pub struct Order {
    id: String,
    user_id: String,
    security_id: String,
    side: Option<OrderSide>,
    quantity: u64,
    price: Decimal,
    filled_quantity: u64,
    status: OrderStatus,
    version: i64,
    pending: Vec<OrderEvent>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            security_id: String::new(),
            side: None,
            quantity: 0,
            price: Decimal::ZERO,
            filled_quantity: 0,
            status: OrderStatus::Pending,
            version: NEW_AGGREGATE_VERSION,
            pending: Vec::new(),
        }
    }
}

impl Order {
    /// Place a new order and emit the placement event.
    ///
    /// # Errors
    /// - `DomainError::Validation` if quantity or price is not positive
    pub fn place(
        id: impl Into<String>,
        user_id: impl Into<String>,
        security_id: impl Into<String>,
        side: OrderSide,
        quantity: u64,
        price: Decimal,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if price <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "price must be positive (got {price})"
            )));
        }

        let mut order = Self::default();
        order.apply(OrderEvent::OrderPlaced {
            order_id: id.into(),
            user_id: user_id.into(),
            security_id: security_id.into(),
            side,
            quantity,
            price,
            placed_at: clock.now(),
        });

        Ok(order)
    }

    /// Cancel the unfilled remainder of the order. Terminal.
    ///
    /// Allowed while PENDING or PARTIALLY_FILLED; an executed or already
    /// cancelled order cannot be cancelled.
    pub fn cancel(&mut self, reason: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_live()?;

        self.apply(OrderEvent::OrderCancelled {
            order_id: self.id.clone(),
            reason: reason.to_string(),
            cancelled_at: clock.now(),
        });
        Ok(())
    }

    /// Record a fill applied by the matching collaborator.
    ///
    /// Advances the cumulative filled quantity and transitions to
    /// PARTIALLY_FILLED or, once the full quantity is filled, EXECUTED.
    /// The per-trade fee is recorded on the event.
    ///
    /// # Errors
    /// - `DomainError::Validation` for a non-positive fill quantity/price
    ///   or a negative fee
    /// - `DomainError::InvariantViolation` if the order is terminal or the
    ///   fill exceeds the remaining quantity
    pub fn execute(
        &mut self,
        matched_order_id: &str,
        executed_quantity: u64,
        executed_price: Decimal,
        fee: Decimal,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_live()?;
        if executed_quantity == 0 {
            return Err(DomainError::validation("executed quantity must be positive"));
        }
        if executed_price <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "executed price must be positive (got {executed_price})"
            )));
        }
        if fee < Decimal::ZERO {
            return Err(DomainError::validation("fee must not be negative"));
        }
        let remaining = self.quantity - self.filled_quantity;
        if executed_quantity > remaining {
            return Err(DomainError::invariant(format!(
                "fill of {executed_quantity} exceeds remaining quantity {remaining}"
            )));
        }

        self.apply(OrderEvent::OrderExecuted {
            order_id: self.id.clone(),
            matched_order_id: matched_order_id.to_string(),
            executed_quantity,
            executed_price,
            fee,
            executed_at: clock.now(),
        });
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "order {} is {:?} and accepts no further operations",
                self.id, self.status
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn security_id(&self) -> &str {
        &self.security_id
    }

    pub fn side(&self) -> Option<OrderSide> {
        self.side
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn filled_quantity(&self) -> u64 {
        self.filled_quantity
    }

    pub fn remaining_quantity(&self) -> u64 {
        self.quantity - self.filled_quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }
}

impl AggregateRoot for Order {
    type Event = OrderEvent;

    fn aggregate_type() -> &'static str {
        "Order"
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

    fn pending(&self) -> &[OrderEvent] {
        &self.pending
    }

    fn pending_mut(&mut self) -> &mut Vec<OrderEvent> {
        &mut self.pending
    }

    fn when(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::OrderPlaced {
                order_id,
                user_id,
                security_id,
                side,
                quantity,
                price,
                ..
            } => {
                self.id = order_id.clone();
                self.user_id = user_id.clone();
                self.security_id = security_id.clone();
                self.side = Some(*side);
                self.quantity = *quantity;
                self.price = *price;
                self.filled_quantity = 0;
                self.status = OrderStatus::Pending;
            }

            OrderEvent::OrderCancelled { .. } => {
                self.status = OrderStatus::Cancelled;
            }

            OrderEvent::OrderExecuted {
                executed_quantity, ..
            } => {
                self.filled_quantity = (self.filled_quantity + executed_quantity).min(self.quantity);
                self.status = if self.filled_quantity == self.quantity {
                    OrderStatus::Executed
                } else {
                    OrderStatus::PartiallyFilled
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FixedClock;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn place_buy(quantity: u64) -> Order {
        Order::place(
            "ord-1",
            "user-1",
            "ACME",
            OrderSide::Buy,
            quantity,
            dec!(101.50),
            &clock(),
        )
        .unwrap()
    }

    #[test]
    fn test_place() {
        let order = place_buy(100);

        assert_eq!(order.id(), "ord-1");
        assert_eq!(order.security_id(), "ACME");
        assert_eq!(order.side(), Some(OrderSide::Buy));
        assert_eq!(order.quantity(), 100);
        assert_eq!(order.filled_quantity(), 0);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.version(), 0);
    }

    #[test]
    fn test_place_validations() {
        assert!(Order::place(
            "ord-1", "user-1", "ACME", OrderSide::Buy, 0, dec!(10), &clock()
        )
        .is_err());
        assert!(Order::place(
            "ord-1", "user-1", "ACME", OrderSide::Sell, 10, dec!(0), &clock()
        )
        .is_err());
        assert!(Order::place(
            "ord-1", "user-1", "ACME", OrderSide::Sell, 10, dec!(-1), &clock()
        )
        .is_err());
    }

    #[test]
    fn test_partial_then_full_fill() {
        let mut order = place_buy(100);

        order
            .execute("ord-9", 40, dec!(101.40), dec!(1.50), &clock())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::PartiallyFilled);
        assert_eq!(order.filled_quantity(), 40);
        assert_eq!(order.remaining_quantity(), 60);

        order
            .execute("ord-10", 60, dec!(101.45), dec!(1.50), &clock())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Executed);
        assert_eq!(order.filled_quantity(), 100);
        assert_eq!(order.remaining_quantity(), 0);
    }

    #[test]
    fn test_overfill_rejected() {
        let mut order = place_buy(100);
        order
            .execute("ord-9", 80, dec!(101.40), dec!(1.50), &clock())
            .unwrap();

        let result = order.execute("ord-10", 30, dec!(101.40), dec!(1.50), &clock());
        assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
        assert_eq!(order.filled_quantity(), 80);
    }

    #[test]
    fn test_execute_validations() {
        let mut order = place_buy(100);

        assert!(order
            .execute("ord-9", 0, dec!(101.40), dec!(1.50), &clock())
            .is_err());
        assert!(order
            .execute("ord-9", 10, dec!(0), dec!(1.50), &clock())
            .is_err());
        assert!(order
            .execute("ord-9", 10, dec!(101.40), dec!(-1), &clock())
            .is_err());
    }

    #[test]
    fn test_cancel_pending() {
        let mut order = place_buy(100);
        order.cancel("user request", &clock()).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_partially_filled() {
        let mut order = place_buy(100);
        order
            .execute("ord-9", 40, dec!(101.40), dec!(1.50), &clock())
            .unwrap();

        order.cancel("user request", &clock()).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.filled_quantity(), 40);
    }

    #[test]
    fn test_cancel_executed_order_fails() {
        let mut order = place_buy(10);
        order
            .execute("ord-9", 10, dec!(101.40), dec!(1.50), &clock())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Executed);

        let result = order.cancel("too late", &clock());
        assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn test_execute_after_cancel_fails() {
        let mut order = place_buy(10);
        order.cancel("user request", &clock()).unwrap();

        let result = order.execute("ord-9", 5, dec!(101.40), dec!(1.50), &clock());
        assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn test_replay_matches_live_state() {
        let mut order = place_buy(100);
        order
            .execute("ord-9", 40, dec!(101.40), dec!(1.50), &clock())
            .unwrap();
        order
            .execute("ord-10", 60, dec!(101.50), dec!(1.50), &clock())
            .unwrap();

        let history: Vec<OrderEvent> = order.pending().to_vec();
        let mut replayed = Order::default();
        replayed.load_from_history(history);

        assert_eq!(replayed.version(), order.version());
        assert_eq!(replayed.filled_quantity(), order.filled_quantity());
        assert_eq!(replayed.status(), order.status());
    }
}
