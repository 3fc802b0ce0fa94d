use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, GatewayError, PaymentGateway, PayBillCmd, SendCmd, TopUpCmd, TopUpMethod,
    TransactionKind, TransactionStatus, WithdrawCmd,
};
use migration::MigratorTrait;

const ALICE: &str = "u-alice";
const BOB: &str = "u-bob";
const BOB_PHONE: &str = "+254700000002";

async fn connect_seeded_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, username, phone) in [
        (ALICE, "alice", "+254700000001"),
        (BOB, "bob", BOB_PHONE),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, username, password, phone, role) VALUES (?, ?, ?, ?, ?)",
            vec![
                id.into(),
                username.into(),
                "password".into(),
                phone.into(),
                "customer".into(),
            ],
        ))
        .await
        .unwrap();
    }
    db
}

async fn engine_with_db() -> Engine {
    let db = connect_seeded_db().await;
    Engine::builder().database(db).build().await.unwrap()
}

struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn stk_push(
        &self,
        _phone: &str,
        _amount_minor: i64,
        _reference: &str,
    ) -> Result<String, GatewayError> {
        Err(GatewayError("push rejected".to_string()))
    }
}

#[tokio::test]
async fn wallet_is_created_once_on_first_access() {
    let engine = engine_with_db().await;

    let first = engine.wallet(ALICE).await.unwrap();
    assert_eq!(first.balance_minor, 0);

    let second = engine.wallet(ALICE).await.unwrap();
    assert_eq!(second.id, first.id);
}

#[tokio::test]
async fn wallet_for_unknown_user_is_not_found() {
    let engine = engine_with_db().await;
    let err = engine.wallet("u-ghost").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn card_topup_credits_balance_synchronously() {
    let engine = engine_with_db().await;

    let tx = engine
        .top_up(TopUpCmd::new(ALICE, 100_000, TopUpMethod::Card))
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.amount_minor, 100_000);
    assert!(tx.reference.starts_with("TOP_"));

    let wallet = engine.wallet(ALICE).await.unwrap();
    assert_eq!(wallet.balance_minor, 100_000);
}

#[tokio::test]
async fn mpesa_topup_stays_pending_until_the_callback() {
    let engine = engine_with_db().await;

    let tx = engine
        .top_up(TopUpCmd::new(ALICE, 50_000, TopUpMethod::Mpesa).phone("+254700000001"))
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert!(tx.gateway_ref.as_deref().unwrap().starts_with("SBX_"));
    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 0);

    let confirmed = engine.confirm_top_up(&tx.reference, true).await.unwrap();
    assert_eq!(confirmed.status, TransactionStatus::Completed);
    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 50_000);

    // The callback can only be applied while the row is pending.
    let err = engine.confirm_top_up(&tx.reference, true).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 50_000);
}

#[tokio::test]
async fn mpesa_topup_requires_a_phone() {
    let engine = engine_with_db().await;
    let err = engine
        .top_up(TopUpCmd::new(ALICE, 50_000, TopUpMethod::Mpesa))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn failed_callback_marks_the_topup_failed() {
    let engine = engine_with_db().await;

    let tx = engine
        .top_up(TopUpCmd::new(ALICE, 50_000, TopUpMethod::Mpesa).phone("+254700000001"))
        .await
        .unwrap();
    let failed = engine.confirm_top_up(&tx.reference, false).await.unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 0);
}

#[tokio::test]
async fn gateway_error_fails_the_topup_and_leaves_balance_untouched() {
    let db = connect_seeded_db().await;
    let engine = Engine::builder()
        .database(db)
        .gateway(Arc::new(FailingGateway))
        .build()
        .await
        .unwrap();

    let err = engine
        .top_up(TopUpCmd::new(ALICE, 50_000, TopUpMethod::Mpesa).phone("+254700000001"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Gateway(_)));

    let transactions = engine
        .list_transactions(ALICE, None, 1, 10)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, TransactionStatus::Failed);
    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 0);
}

#[tokio::test]
async fn send_moves_balance_and_writes_a_paired_ledger() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 100_000, TopUpMethod::Card))
        .await
        .unwrap();

    let sent = engine
        .send(SendCmd::new(ALICE, BOB_PHONE, 30_000).note("lunch"))
        .await
        .unwrap();
    assert_eq!(sent.amount_minor, -30_000);
    assert_eq!(sent.counterparty_user_id.as_deref(), Some(BOB));
    assert!(sent.reference.starts_with("TRF_"));

    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 70_000);
    assert_eq!(engine.wallet(BOB).await.unwrap().balance_minor, 30_000);

    let received: Vec<_> = engine
        .list_transactions(BOB, Some(TransactionKind::Receive), 1, 10)
        .await
        .unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].amount_minor, 30_000);
    assert_eq!(received[0].reference, sent.reference);
    assert_eq!(received[0].counterparty_user_id.as_deref(), Some(ALICE));
}

#[tokio::test]
async fn send_over_balance_changes_nothing() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 10_000, TopUpMethod::Card))
        .await
        .unwrap();

    let err = engine
        .send(SendCmd::new(ALICE, BOB_PHONE, 30_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));

    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 10_000);
    assert_eq!(engine.wallet(BOB).await.unwrap().balance_minor, 0);
    let sends = engine
        .list_transactions(ALICE, Some(TransactionKind::Send), 1, 10)
        .await
        .unwrap();
    assert!(sends.is_empty());
}

#[tokio::test]
async fn send_rejects_unknown_and_self_recipients() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 10_000, TopUpMethod::Card))
        .await
        .unwrap();

    let err = engine
        .send(SendCmd::new(ALICE, "+254799999999", 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .send(SendCmd::new(ALICE, "+254700000001", 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRecipient(_)));
}

#[tokio::test]
async fn send_notifies_the_recipient() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 10_000, TopUpMethod::Card))
        .await
        .unwrap();
    engine
        .send(SendCmd::new(ALICE, BOB_PHONE, 5_000))
        .await
        .unwrap();

    let notifications = engine.list_notifications(BOB, 10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "wallet_received");
    assert!(!notifications[0].read);

    engine
        .mark_notification_read(notifications[0].id, BOB)
        .await
        .unwrap();
    let notifications = engine.list_notifications(BOB, 10).await.unwrap();
    assert!(notifications[0].read);
}

#[tokio::test]
async fn live_events_reach_connected_subscribers() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 10_000, TopUpMethod::Card))
        .await
        .unwrap();

    let mut events = engine.subscribe_notifications();
    engine
        .send(SendCmd::new(ALICE, BOB_PHONE, 5_000))
        .await
        .unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, "wallet_received");
    assert_eq!(event.user_id, BOB);
}

#[tokio::test]
async fn pay_bill_debits_and_records_metadata() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 100_000, TopUpMethod::Card))
        .await
        .unwrap();

    let tx = engine
        .pay_bill(
            PayBillCmd::new(ALICE, "electricity", "12345678", 60_000).provider("Kenya Power"),
        )
        .await
        .unwrap();
    assert_eq!(tx.amount_minor, -60_000);
    assert_eq!(tx.bill_type.as_deref(), Some("electricity"));
    assert_eq!(tx.account_number.as_deref(), Some("12345678"));
    assert_eq!(tx.bill_provider.as_deref(), Some("Kenya Power"));
    assert!(tx.reference.starts_with("BILL_"));

    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 40_000);
}

#[tokio::test]
async fn pay_bill_awards_tier_scaled_points() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 100_000, TopUpMethod::Card))
        .await
        .unwrap();
    engine
        .pay_bill(PayBillCmd::new(ALICE, "water", "A-100", 60_000))
        .await
        .unwrap();

    // 60 000 minor units = KES 600 = 6 base points, Bronze multiplier 1.
    let account = engine.loyalty_account(ALICE).await.unwrap();
    assert_eq!(account.points, 6);
    assert_eq!(account.lifetime_points, 6);
}

#[tokio::test]
async fn pay_bill_over_balance_changes_nothing() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 50_000, TopUpMethod::Card))
        .await
        .unwrap();

    let err = engine
        .pay_bill(PayBillCmd::new(ALICE, "electricity", "12345678", 60_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));
    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 50_000);
}

#[tokio::test]
async fn withdraw_debits_the_wallet() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 50_000, TopUpMethod::Card))
        .await
        .unwrap();

    let tx = engine
        .withdraw(WithdrawCmd::new(ALICE, 20_000, "+254700000001"))
        .await
        .unwrap();
    assert_eq!(tx.amount_minor, -20_000);
    assert!(tx.reference.starts_with("WDR_"));
    assert_eq!(engine.wallet(ALICE).await.unwrap().balance_minor, 30_000);
}

#[tokio::test]
async fn rejects_non_positive_amounts() {
    let engine = engine_with_db().await;
    for result in [
        engine
            .top_up(TopUpCmd::new(ALICE, 0, TopUpMethod::Card))
            .await,
        engine.send(SendCmd::new(ALICE, BOB_PHONE, -5)).await,
        engine
            .pay_bill(PayBillCmd::new(ALICE, "tv", "X", 0))
            .await,
        engine.withdraw(WithdrawCmd::new(ALICE, -1, "p")).await,
    ] {
        assert!(matches!(result.unwrap_err(), EngineError::InvalidAmount(_)));
    }
}

#[tokio::test]
async fn transaction_listing_filters_and_paginates() {
    let engine = engine_with_db().await;
    engine
        .top_up(TopUpCmd::new(ALICE, 100_000, TopUpMethod::Card))
        .await
        .unwrap();
    engine
        .pay_bill(PayBillCmd::new(ALICE, "water", "A-1", 10_000))
        .await
        .unwrap();
    engine
        .pay_bill(PayBillCmd::new(ALICE, "tv", "B-2", 10_000))
        .await
        .unwrap();

    let all = engine.list_transactions(ALICE, None, 1, 10).await.unwrap();
    assert_eq!(all.len(), 3);

    let bills = engine
        .list_transactions(ALICE, Some(TransactionKind::BillPayment), 1, 10)
        .await
        .unwrap();
    assert_eq!(bills.len(), 2);

    let first_page = engine.list_transactions(ALICE, None, 1, 2).await.unwrap();
    assert_eq!(first_page.len(), 2);
    let second_page = engine.list_transactions(ALICE, None, 2, 2).await.unwrap();
    assert_eq!(second_page.len(), 1);
}
