//! Integration tests driving aggregates through the event store the way a
//! command handler does: load (or construct), invoke a domain operation,
//! save, and let the optimistic-concurrency gate arbitrate races.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use corebank::{
    AccountType, AggregateRoot, BankAccount, Config, DomainError, EventStore, EventStoreError,
    EventStoreExt, FixedClock, InMemoryEventStore, Loan, LoanStatus, Money, Order, OrderSide,
    OrderStatus,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("corebank=debug")
        .with_test_writer()
        .try_init();
}

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

fn eur(amount: Decimal) -> Money {
    Money::new(amount, "EUR").unwrap()
}

fn open_account(id: &str, initial: Decimal) -> BankAccount {
    let generator = Config::default().account_number_generator().unwrap();
    BankAccount::open(
        id,
        "user-1",
        generator.generate(1),
        AccountType::Checking,
        initial,
        "EUR",
        &clock(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_save_then_load_rebuilds_state() {
    init_tracing();
    let store = InMemoryEventStore::new();

    let mut account = open_account("acc-1", dec!(100));
    account.deposit(eur(dec!(50)), &clock()).unwrap();
    account.withdraw(eur(dec!(25.50)), &clock()).unwrap();

    store.save_aggregate(&mut account).await.unwrap();
    assert!(!account.has_pending());

    let loaded: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    assert_eq!(loaded.id(), "acc-1");
    assert_eq!(loaded.version(), account.version());
    assert_eq!(loaded.balance(), Some(&eur(dec!(124.50))));
    assert!(!loaded.has_pending());
}

#[tokio::test]
async fn test_load_unknown_aggregate_is_not_found() {
    let store = InMemoryEventStore::new();
    let result: Result<BankAccount, _> = store.load_aggregate("missing").await;
    assert!(matches!(result, Err(EventStoreError::StreamNotFound { .. })));
}

#[tokio::test]
async fn test_save_spans_multiple_commands() {
    let store = InMemoryEventStore::new();

    let mut account = open_account("acc-1", dec!(100));
    store.save_aggregate(&mut account).await.unwrap();

    // Next command on the reloaded aggregate
    let mut account: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    account.deposit(eur(dec!(10)), &clock()).unwrap();
    store.save_aggregate(&mut account).await.unwrap();

    let loaded: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    assert_eq!(loaded.balance(), Some(&eur(dec!(110))));
    assert_eq!(loaded.version(), 1);
}

#[tokio::test]
async fn test_concurrent_commands_second_writer_conflicts() {
    init_tracing();
    let store = InMemoryEventStore::new();

    // Advance the stream to version 3
    let mut account = open_account("acc-1", dec!(100));
    account.deposit(eur(dec!(10)), &clock()).unwrap();
    account.deposit(eur(dec!(10)), &clock()).unwrap();
    account.deposit(eur(dec!(10)), &clock()).unwrap();
    store.save_aggregate(&mut account).await.unwrap();

    // Two handlers load the same aggregate at version 3
    let mut first: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    let mut second: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    assert_eq!(first.version(), 3);
    assert_eq!(second.version(), 3);

    first.deposit(eur(dec!(5)), &clock()).unwrap();
    second.withdraw(eur(dec!(5)), &clock()).unwrap();

    // First commit wins and advances the stream to version 4
    store.save_aggregate(&mut first).await.unwrap();
    assert_eq!(
        store
            .stream_version(BankAccount::aggregate_type(), "acc-1")
            .await
            .unwrap(),
        Some(4)
    );

    // Second commit loses with a conflict and writes nothing
    let result = store.save_aggregate(&mut second).await;
    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict {
            expected: 3,
            actual: 4,
            ..
        })
    ));
    assert!(second.has_pending());

    // The loser reloads (picking up the winner's events) and retries
    let mut second: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    assert_eq!(second.balance(), Some(&eur(dec!(135))));
    second.withdraw(eur(dec!(5)), &clock()).unwrap();
    store.save_aggregate(&mut second).await.unwrap();

    let loaded: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    assert_eq!(loaded.balance(), Some(&eur(dec!(130))));
    assert_eq!(loaded.version(), 5);
}

#[tokio::test]
async fn test_failed_command_leaves_stream_untouched() {
    let store = InMemoryEventStore::new();

    let mut account = open_account("acc-1", dec!(100));
    store.save_aggregate(&mut account).await.unwrap();

    let mut account: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    let result = account.withdraw(eur(dec!(150)), &clock());
    assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));
    assert!(!account.has_pending());

    // Saving with no pending events is a no-op
    store.save_aggregate(&mut account).await.unwrap();
    assert_eq!(
        store
            .stream_version(BankAccount::aggregate_type(), "acc-1")
            .await
            .unwrap(),
        Some(0)
    );
}

#[tokio::test]
async fn test_transfer_commits_each_side_independently() {
    let store = InMemoryEventStore::new();

    let mut sender = open_account("acc-1", dec!(100));
    let mut recipient = open_account("acc-2", dec!(0));
    store.save_aggregate(&mut sender).await.unwrap();
    store.save_aggregate(&mut recipient).await.unwrap();

    let transfer_id = Uuid::new_v4();

    let mut sender: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    sender
        .transfer_out("acc-2", transfer_id, eur(dec!(40)), &clock())
        .unwrap();
    store.save_aggregate(&mut sender).await.unwrap();

    // Window where only the sender side is durable: tolerated by design
    let recipient_so_far: BankAccount = store.load_aggregate("acc-2").await.unwrap();
    assert_eq!(recipient_so_far.balance(), Some(&eur(dec!(0))));

    let mut recipient: BankAccount = store.load_aggregate("acc-2").await.unwrap();
    recipient
        .transfer_in("acc-1", transfer_id, eur(dec!(40)), &clock())
        .unwrap();
    store.save_aggregate(&mut recipient).await.unwrap();

    let sender: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    let recipient: BankAccount = store.load_aggregate("acc-2").await.unwrap();
    assert_eq!(sender.balance(), Some(&eur(dec!(60))));
    assert_eq!(recipient.balance(), Some(&eur(dec!(40))));
}

#[tokio::test]
async fn test_loan_roundtrip_preserves_schedule() {
    let store = InMemoryEventStore::new();

    let mut loan = Loan::grant(
        "loan-1",
        "user-1",
        dec!(10000),
        "EUR",
        dec!(0.06),
        12,
        dec!(0.01),
        &clock(),
    )
    .unwrap();
    loan.generate_schedule(&clock()).unwrap();
    store.save_aggregate(&mut loan).await.unwrap();

    let loaded: Loan = store.load_aggregate("loan-1").await.unwrap();
    assert_eq!(loaded.status(), LoanStatus::Active);
    assert_eq!(loaded.schedule().len(), 12);
    assert_eq!(loaded.monthly_payment(), loan.monthly_payment());

    let principal_sum: Decimal = loaded.schedule().iter().map(|i| i.principal).sum();
    assert_eq!(principal_sum, dec!(10000.00));
}

#[tokio::test]
async fn test_order_lifecycle_through_store() {
    let store = InMemoryEventStore::new();

    let mut order = Order::place(
        "ord-1",
        "user-1",
        "ACME",
        OrderSide::Sell,
        100,
        dec!(99.95),
        &clock(),
    )
    .unwrap();
    store.save_aggregate(&mut order).await.unwrap();

    // The matching collaborator applies fills on reloaded instances
    let mut order: Order = store.load_aggregate("ord-1").await.unwrap();
    order
        .execute("ord-7", 30, dec!(99.95), dec!(0.25), &clock())
        .unwrap();
    store.save_aggregate(&mut order).await.unwrap();

    let mut order: Order = store.load_aggregate("ord-1").await.unwrap();
    assert_eq!(order.status(), OrderStatus::PartiallyFilled);
    order
        .execute("ord-8", 70, dec!(100.00), dec!(0.25), &clock())
        .unwrap();
    store.save_aggregate(&mut order).await.unwrap();

    let mut order: Order = store.load_aggregate("ord-1").await.unwrap();
    assert_eq!(order.status(), OrderStatus::Executed);
    assert_eq!(order.filled_quantity(), 100);

    // Terminal: the stream stays readable but rejects commands
    let result = order.cancel("too late", &clock());
    assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
}

#[tokio::test]
async fn test_terminal_account_survives_reload() {
    let store = InMemoryEventStore::new();

    let mut account = open_account("acc-1", dec!(100));
    account.close(&clock()).unwrap();
    store.save_aggregate(&mut account).await.unwrap();

    let mut loaded: BankAccount = store.load_aggregate("acc-1").await.unwrap();
    let result = loaded.deposit(eur(dec!(10)), &clock());
    assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
}
