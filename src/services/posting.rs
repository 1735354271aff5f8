//! Shared posting path - the single atomic write sequence behind every
//! ledger mutation.
//!
//! Each mutating service (cashback, referral, withdrawal, order) describes
//! its effect as a [`LedgerEntry`] and hands it to [`post_entry`]. There is
//! exactly one code path that touches the account row.
//!
//! # Atomicity Guarantees
//!
//! The whole sequence runs inside one PostgreSQL transaction:
//!
//! 1. Lock the account row (`SELECT .. FOR UPDATE`)
//! 2. Check the balance-sufficiency guard against the locked row
//! 3. Insert the transaction record
//! 4. Insert the immutable event
//! 5. Update the account totals (computed from the locked row, floored at
//!    zero)
//! 6. Insert the audit log with before/after snapshots
//! 7. Commit
//!
//! The row lock serializes concurrent mutations on the same account, so two
//! callers can never both apply deltas on top of the same stale totals, and
//! two balance checks can never jointly overdraw the account. A failure at
//! any step rolls the database transaction back; an orphaned transaction or
//! event without its account update cannot exist.

use crate::{
    db::DbPool,
    error::LedgerError,
    models::{
        account::{Account, BalanceChange},
        audit::{AuditLog, RequestContext},
        event::ImmutableEvent,
        transaction::{LedgerTransaction, TransactionType},
    },
};
use serde_json::Value;
use uuid::Uuid;

/// Full description of one ledger mutation, ready to be applied.
///
/// Built by the service layer after its validation has passed; everything in
/// here is pure data, so the services stay unit-testable without a database.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// Account owner the mutation applies to
    pub user_id: Uuid,

    /// Recorded transaction kind
    pub transaction_type: TransactionType,

    /// Signed amount recorded on the transaction (credits positive, debits
    /// negative, status markers zero)
    pub amount_cents: i64,

    /// Id of the external entity that caused the mutation
    pub reference_id: Uuid,

    /// Free-form caller context stored on the transaction
    pub metadata: Option<Value>,

    /// Event kind for the immutable event
    pub event_type: &'static str,

    /// Structured snapshot of the operation inputs
    pub event_data: Value,

    /// Audit log action, e.g. `create_withdrawal`
    pub action: &'static str,

    /// Audit log resource type, e.g. `withdrawal`
    pub resource_type: &'static str,

    /// Deltas to apply to the account's running totals
    pub change: BalanceChange,

    /// When set, the account's available balance must be at least this many
    /// cents at the moment the row is locked, else the mutation fails with
    /// `InsufficientBalance` and nothing is written.
    pub required_available_cents: Option<i64>,
}

/// Composite result of one ledger mutation.
///
/// Carries all four artifacts the write sequence produced.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LedgerReceipt {
    pub transaction: LedgerTransaction,
    pub event: ImmutableEvent,
    pub audit_log: AuditLog,
    pub account: Account,
}

/// Apply one ledger entry atomically.
///
/// # Errors
///
/// - `AccountNotFound`: no account row for the user
/// - `InsufficientBalance`: the entry's guard failed against the locked row
/// - `Persistence`: any write failed; the database transaction is rolled
///   back and nothing is visible
pub async fn post_entry(
    pool: &DbPool,
    entry: LedgerEntry,
    ctx: &RequestContext,
) -> Result<LedgerReceipt, LedgerError> {
    let mut tx = pool.begin().await?;

    // Lock the account row for the duration of the write sequence.
    // FOR UPDATE blocks concurrent mutations on the same user until commit.
    let before = sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE user_id = $1 FOR UPDATE",
    )
    .bind(entry.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(LedgerError::AccountNotFound)?;

    // Balance-sufficiency guard, evaluated against the locked row so a
    // concurrent withdrawal and order cannot both pass against the same
    // pre-mutation balance.
    if let Some(required) = entry.required_available_cents {
        if before.available_balance_cents() < required {
            tx.rollback().await?;
            return Err(LedgerError::InsufficientBalance);
        }
    }

    let after = entry.change.applied_to(before.totals());

    // Append the transaction record
    let transaction = sqlx::query_as::<_, LedgerTransaction>(
        r#"
        INSERT INTO transactions (user_id, transaction_type, amount_cents, reference_id, metadata)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.transaction_type.as_str())
    .bind(entry.amount_cents)
    .bind(entry.reference_id)
    .bind(&entry.metadata)
    .fetch_one(&mut *tx)
    .await?;

    // Append the immutable event narrating it
    let event = sqlx::query_as::<_, ImmutableEvent>(
        r#"
        INSERT INTO immutable_events (transaction_id, event_type, event_data)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(transaction.id)
    .bind(entry.event_type)
    .bind(&entry.event_data)
    .fetch_one(&mut *tx)
    .await?;

    // Write back the new totals
    let account = sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET total_earned_cents = $1,
            total_withdrawn_cents = $2,
            total_pending_withdrawals_cents = $3,
            total_orders_cents = $4,
            updated_at = NOW()
        WHERE user_id = $5
        RETURNING *
        "#,
    )
    .bind(after.earned_cents)
    .bind(after.withdrawn_cents)
    .bind(after.pending_withdrawals_cents)
    .bind(after.orders_cents)
    .bind(entry.user_id)
    .fetch_one(&mut *tx)
    .await?;

    // Append the audit trail entry with before/after snapshots
    let audit_log = sqlx::query_as::<_, AuditLog>(
        r#"
        INSERT INTO audit_logs (user_id, action, resource_type, resource_id, before, after, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.resource_type)
    .bind(entry.reference_id)
    .bind(before.snapshot())
    .bind(account.snapshot())
    .bind(&ctx.ip_address)
    .bind(&ctx.user_agent)
    .fetch_one(&mut *tx)
    .await?;

    // Commit all four writes atomically
    tx.commit().await?;

    Ok(LedgerReceipt {
        transaction,
        event,
        audit_log,
        account,
    })
}

/// Fold extra entries (a reversal reason, old/new statuses) into caller
/// metadata.
///
/// Caller-supplied objects keep their keys; non-object metadata is nested
/// under `context` so nothing the caller sent is lost.
pub(crate) fn merge_metadata(base: Option<Value>, extra: Value) -> Value {
    let Value::Object(extra_map) = extra else {
        return extra;
    };

    let mut map = match base {
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut map = serde_json::Map::new();
            map.insert("context".to_string(), other);
            map
        }
        None => serde_json::Map::new(),
    };
    map.extend(extra_map);
    Value::Object(map)
}
