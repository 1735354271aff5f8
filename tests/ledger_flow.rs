//! End-to-end ledger behavior against a real PostgreSQL database.
//!
//! `#[sqlx::test]` provisions an isolated database per test and applies the
//! migrations in `./migrations` before the test body runs.

use cashback_ledger::{
    error::LedgerError,
    models::audit::RequestContext,
    services::{balance, cashback, order, referral, withdrawal},
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn ctx() -> RequestContext {
    RequestContext {
        ip_address: Some("203.0.113.9".to_string()),
        user_agent: Some("cashback-tracker/2.1".to_string()),
    }
}

/// Assert the balance invariant: available = max(0, earned - withdrawn - pending - orders).
async fn assert_invariant(pool: &PgPool, user_id: Uuid) {
    let summary = balance::get_available_balance(pool, user_id).await.unwrap();
    let raw = summary.total_earned_cents
        - summary.total_withdrawn_cents
        - summary.total_pending_withdrawals_cents
        - summary.total_orders_cents;
    assert_eq!(summary.available_balance_cents, raw.max(0));
    assert!(summary.available_balance_cents >= 0);
}

async fn row_counts(pool: &PgPool) -> (i64, i64, i64) {
    let transactions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
        .fetch_one(pool)
        .await
        .unwrap();
    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM immutable_events")
        .fetch_one(pool)
        .await
        .unwrap();
    let audits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool)
        .await
        .unwrap();
    (transactions, events, audits)
}

#[sqlx::test]
async fn ensure_account_is_idempotent(pool: PgPool) {
    let user_id = Uuid::new_v4();

    let first = balance::ensure_account(&pool, user_id).await.unwrap();
    assert_eq!(first.total_earned_cents, 0);

    cashback::add_cashback(&pool, user_id, 10_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    // A second ensure must not reset anything.
    let second = balance::ensure_account(&pool, user_id).await.unwrap();
    assert_eq!(second.total_earned_cents, 10_00);
}

#[sqlx::test]
async fn balance_of_unknown_user_is_account_not_found(pool: PgPool) {
    let err = balance::get_available_balance(&pool, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound));
}

#[sqlx::test]
async fn crediting_an_unprovisioned_user_fails(pool: PgPool) {
    let err = cashback::add_cashback(&pool, Uuid::new_v4(), 50_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound));
    assert_eq!(row_counts(&pool).await, (0, 0, 0));
}

#[sqlx::test]
async fn cashback_credit_updates_totals_and_audit_snapshots(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    cashback::add_cashback(&pool, user_id, 100_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let reference_id = Uuid::new_v4();
    let receipt = cashback::add_cashback(
        &pool,
        user_id,
        50_00,
        reference_id,
        Some(json!({"store": "acme"})),
        &ctx(),
    )
    .await
    .unwrap();

    assert_eq!(receipt.account.total_earned_cents, 150_00);
    assert_eq!(receipt.transaction.transaction_type, "cashback");
    assert_eq!(receipt.transaction.amount_cents, 50_00);
    assert_eq!(receipt.transaction.reference_id, reference_id);
    assert_eq!(receipt.event.transaction_id, receipt.transaction.id);
    assert_eq!(receipt.event.event_type, "cashback_credited");

    // The audit log captures the account before and after the mutation.
    assert_eq!(receipt.audit_log.before["total_earned_cents"], json!(100_00));
    assert_eq!(receipt.audit_log.after["total_earned_cents"], json!(150_00));
    assert_eq!(receipt.audit_log.resource_id, reference_id);
    assert_eq!(receipt.audit_log.ip_address.as_deref(), Some("203.0.113.9"));

    assert_invariant(&pool, user_id).await;
}

#[sqlx::test]
async fn invalid_amounts_are_rejected_before_any_write(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();

    let zero = cashback::add_cashback(&pool, user_id, 0, Uuid::new_v4(), None, &ctx()).await;
    assert!(matches!(zero.unwrap_err(), LedgerError::InvalidAmount));

    let negative =
        withdrawal::create_withdrawal(&pool, user_id, -5_00, Uuid::new_v4(), None, &ctx()).await;
    assert!(matches!(negative.unwrap_err(), LedgerError::InvalidAmount));

    assert_eq!(row_counts(&pool).await, (0, 0, 0));
}

#[sqlx::test]
async fn insufficient_withdrawal_writes_nothing(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    cashback::add_cashback(&pool, user_id, 100_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();
    let counts_before = row_counts(&pool).await;

    let err = withdrawal::create_withdrawal(&pool, user_id, 200_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance));

    // No transaction, no event, no audit log, no account mutation.
    assert_eq!(row_counts(&pool).await, counts_before);
    let account = balance::get_account(&pool, user_id).await.unwrap();
    assert_eq!(account.total_pending_withdrawals_cents, 0);
    assert_eq!(account.available_balance_cents(), 100_00);
}

#[sqlx::test]
async fn withdrawal_lifecycle_moves_pending_into_withdrawn(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    cashback::add_cashback(&pool, user_id, 500_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let withdrawal_id = Uuid::new_v4();
    let created =
        withdrawal::create_withdrawal(&pool, user_id, 200_00, withdrawal_id, None, &ctx())
            .await
            .unwrap();
    assert_eq!(created.transaction.amount_cents, -200_00);
    assert_eq!(created.account.total_pending_withdrawals_cents, 200_00);
    assert_eq!(created.account.available_balance_cents(), 300_00);

    let completed = withdrawal::change_withdrawal_status(
        &pool,
        user_id,
        withdrawal_id,
        "processing",
        "completed",
        200_00,
        None,
        &ctx(),
    )
    .await
    .unwrap();
    assert_eq!(completed.transaction.transaction_type, "withdrawal_completed");
    // Status markers carry amount zero; the moved amount lives in the event.
    assert_eq!(completed.transaction.amount_cents, 0);
    assert_eq!(completed.account.total_pending_withdrawals_cents, 0);
    assert_eq!(completed.account.total_withdrawn_cents, 200_00);

    // Settling the same withdrawal again is a no-op transition.
    let repeat = withdrawal::change_withdrawal_status(
        &pool,
        user_id,
        withdrawal_id,
        "completed",
        "completed",
        200_00,
        None,
        &ctx(),
    )
    .await
    .unwrap_err();
    assert!(matches!(repeat, LedgerError::NoOpTransition(_)));

    // And a terminal state cannot be left.
    let reopen = withdrawal::change_withdrawal_status(
        &pool,
        user_id,
        withdrawal_id,
        "completed",
        "processing",
        200_00,
        None,
        &ctx(),
    )
    .await
    .unwrap_err();
    assert!(matches!(reopen, LedgerError::UnsupportedTransition { .. }));

    assert_invariant(&pool, user_id).await;
}

#[sqlx::test]
async fn cancelled_withdrawal_releases_pending_only(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    cashback::add_cashback(&pool, user_id, 300_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let withdrawal_id = Uuid::new_v4();
    withdrawal::create_withdrawal(&pool, user_id, 300_00, withdrawal_id, None, &ctx())
        .await
        .unwrap();

    let cancelled = withdrawal::change_withdrawal_status(
        &pool,
        user_id,
        withdrawal_id,
        "processing",
        "cancelled",
        300_00,
        None,
        &ctx(),
    )
    .await
    .unwrap();

    assert_eq!(cancelled.transaction.transaction_type, "withdrawal_cancelled");
    assert_eq!(cancelled.account.total_pending_withdrawals_cents, 0);
    assert_eq!(cancelled.account.total_withdrawn_cents, 0);
    assert_eq!(cancelled.account.available_balance_cents(), 300_00);
}

#[sqlx::test]
async fn referral_reversal_floors_at_zero(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    referral::add_referral_commission(&pool, user_id, 30_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let receipt = referral::reverse_referral_commission(
        &pool,
        user_id,
        50_00,
        Uuid::new_v4(),
        "referred order reversed",
        None,
        &ctx(),
    )
    .await
    .unwrap();

    // The reversal is capped at the remaining earnings, never negative.
    assert_eq!(receipt.account.total_earned_cents, 0);
    assert_eq!(receipt.transaction.transaction_type, "referral_reversed");
    assert_eq!(receipt.transaction.amount_cents, -50_00);
    assert_eq!(
        receipt.transaction.metadata.as_ref().unwrap()["reason"],
        json!("referred order reversed")
    );

    assert_invariant(&pool, user_id).await;
}

#[sqlx::test]
async fn order_cancel_and_reactivate_recheck_balance(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    cashback::add_cashback(&pool, user_id, 400_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let order_id = Uuid::new_v4();
    let created = order::create_order(&pool, user_id, 300_00, order_id, None, &ctx())
        .await
        .unwrap();
    assert_eq!(created.account.total_orders_cents, 300_00);
    assert_eq!(created.account.available_balance_cents(), 100_00);

    let cancelled = order::change_order_status(
        &pool, user_id, order_id, "pending", "cancelled", 300_00, None, &ctx(),
    )
    .await
    .unwrap();
    assert_eq!(cancelled.transaction.transaction_type, "order_cancelled");
    assert_eq!(cancelled.account.total_orders_cents, 0);
    assert_eq!(cancelled.account.available_balance_cents(), 400_00);

    // Spend part of the released funds, then try to un-cancel the order.
    withdrawal::create_withdrawal(&pool, user_id, 200_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    // Reactivation checks the balance now, not at original creation time:
    // 400 - 200 pending = 200 available < 300.
    let rejected = order::change_order_status(
        &pool, user_id, order_id, "cancelled", "pending", 300_00, None, &ctx(),
    )
    .await
    .unwrap_err();
    assert!(matches!(rejected, LedgerError::InsufficientBalance));

    let account = balance::get_account(&pool, user_id).await.unwrap();
    assert_eq!(account.total_orders_cents, 0);

    // Fulfillment-only churn never reaches the reservation.
    let churn = order::change_order_status(
        &pool, user_id, order_id, "pending", "shipped", 300_00, None, &ctx(),
    )
    .await
    .unwrap_err();
    assert!(matches!(churn, LedgerError::UnsupportedTransition { .. }));

    assert_invariant(&pool, user_id).await;
}

#[sqlx::test]
async fn order_reactivation_succeeds_when_funds_return(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    cashback::add_cashback(&pool, user_id, 300_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let order_id = Uuid::new_v4();
    order::create_order(&pool, user_id, 300_00, order_id, None, &ctx())
        .await
        .unwrap();
    order::change_order_status(
        &pool, user_id, order_id, "pending", "cancelled", 300_00, None, &ctx(),
    )
    .await
    .unwrap();

    let reactivated = order::change_order_status(
        &pool, user_id, order_id, "cancelled", "pending", 300_00, None, &ctx(),
    )
    .await
    .unwrap();

    // Re-reservation is recorded as order_created with a zero status marker.
    assert_eq!(reactivated.transaction.transaction_type, "order_created");
    assert_eq!(reactivated.transaction.amount_cents, 0);
    assert_eq!(reactivated.account.total_orders_cents, 300_00);
    assert_eq!(reactivated.account.available_balance_cents(), 0);
}

#[sqlx::test]
async fn transaction_history_is_newest_first(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();

    cashback::add_cashback(&pool, user_id, 10_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();
    referral::add_referral_commission(&pool, user_id, 20_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();
    withdrawal::create_withdrawal(&pool, user_id, 5_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let history = balance::list_transactions(&pool, user_id, None).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].transaction_type, "withdrawal_processing");
    assert!(history[0].created_at >= history[2].created_at);

    let limited = balance::list_transactions(&pool, user_id, Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[sqlx::test]
async fn concurrent_withdrawals_allow_exactly_one_success(pool: PgPool) {
    let user_id = Uuid::new_v4();
    balance::ensure_account(&pool, user_id).await.unwrap();
    // Balance covers exactly one withdrawal.
    cashback::add_cashback(&pool, user_id, 100_00, Uuid::new_v4(), None, &ctx())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            withdrawal::create_withdrawal(
                &pool,
                user_id,
                100_00,
                Uuid::new_v4(),
                None,
                &RequestContext::default(),
            )
            .await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LedgerError::InsufficientBalance) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // The row lock serializes the balance checks: one winner, the rest
    // observe the post-mutation balance.
    assert_eq!(successes, 1);
    assert_eq!(insufficient, 3);

    let account = balance::get_account(&pool, user_id).await.unwrap();
    assert_eq!(account.total_pending_withdrawals_cents, 100_00);
    assert_eq!(account.available_balance_cents(), 0);
    assert_invariant(&pool, user_id).await;
}
