//! Order service - reserves funds against store purchases and releases them
//! on cancellation.
//!
//! # State machine
//!
//! A reservation is either active (funds held in `total_orders`) or
//! released (`cancelled`). Unlike withdrawals, reactivation out of
//! `cancelled` is permitted: an operator can un-cancel a store order. Order
//! statuses themselves are free-form strings owned by the storefront; the
//! ledger only cares whether a transition crosses the `cancelled` boundary.

use crate::{
    db::DbPool,
    error::LedgerError,
    models::{account::BalanceChange, audit::RequestContext, transaction::TransactionType},
    services::posting::{self, LedgerEntry, LedgerReceipt, merge_metadata},
};
use serde_json::{Value, json};
use uuid::Uuid;

/// The one order status the ledger interprets.
const CANCELLED: &str = "cancelled";

/// Reserve funds against a new store order.
///
/// # Effect
///
/// Appends Transaction(`order_created`, -amount) and holds the amount in
/// `total_orders`.
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative
/// - `InsufficientBalance`: available balance below the order amount
/// - `AccountNotFound`: the user has no account row
pub async fn create_order(
    pool: &DbPool,
    user_id: Uuid,
    amount_cents: i64,
    reference_id: Uuid,
    metadata: Option<Value>,
    ctx: &RequestContext,
) -> Result<LedgerReceipt, LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount);
    }

    let entry = LedgerEntry {
        user_id,
        transaction_type: TransactionType::OrderCreated,
        amount_cents: -amount_cents,
        reference_id,
        event_type: "order_created",
        event_data: json!({
            "user_id": user_id,
            "amount_cents": amount_cents,
            "reference_id": reference_id,
            "metadata": metadata,
        }),
        action: "create_order",
        resource_type: "order",
        change: BalanceChange {
            orders_cents: amount_cents,
            ..Default::default()
        },
        required_available_cents: Some(amount_cents),
        metadata,
    };

    posting::post_entry(pool, entry, ctx).await
}

/// Move an order to a new status and settle its reservation.
///
/// `amount_cents` is the amount originally reserved; the recorded
/// transaction is a status marker with amount zero.
///
/// # Transitions
///
/// - into `cancelled` from any non-cancelled status: release the
///   reservation (`total_orders` decreases, floor 0)
/// - out of `cancelled` into any non-cancelled status: re-reserve. The
///   available balance is re-checked at this moment, not at original
///   creation time, since it may have changed since.
///
/// A pair where neither side is `cancelled` does not touch the reservation
/// and is rejected; callers only notify the ledger of reservation-affecting
/// changes.
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative
/// - `NoOpTransition`: old and new status are identical
/// - `UnsupportedTransition`: neither status is `cancelled`
/// - `InsufficientBalance`: reactivation amount exceeds the available
///   balance at reactivation time
pub async fn change_order_status(
    pool: &DbPool,
    user_id: Uuid,
    reference_id: Uuid,
    old_status: &str,
    new_status: &str,
    amount_cents: i64,
    metadata: Option<Value>,
    ctx: &RequestContext,
) -> Result<LedgerReceipt, LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount);
    }

    let old = old_status.trim().to_ascii_lowercase();
    let new = new_status.trim().to_ascii_lowercase();
    let plan = plan_status_change(&old, &new)?;

    let (transaction_type, change, required_available_cents) = match plan {
        OrderTransition::Release => (
            TransactionType::OrderCancelled,
            BalanceChange {
                orders_cents: -amount_cents,
                ..Default::default()
            },
            None,
        ),
        OrderTransition::Reactivate => (
            TransactionType::OrderCreated,
            BalanceChange {
                orders_cents: amount_cents,
                ..Default::default()
            },
            Some(amount_cents),
        ),
    };

    let metadata = merge_metadata(
        metadata,
        json!({
            "old_status": old,
            "new_status": new,
            "order_amount_cents": amount_cents,
        }),
    );

    let entry = LedgerEntry {
        user_id,
        transaction_type,
        amount_cents: 0,
        reference_id,
        event_type: "order_status_changed",
        event_data: json!({
            "user_id": user_id,
            "reference_id": reference_id,
            "old_status": old,
            "new_status": new,
            "amount_cents": amount_cents,
        }),
        action: "change_order_status",
        resource_type: "order",
        change,
        required_available_cents,
        metadata: Some(metadata),
    };

    posting::post_entry(pool, entry, ctx).await
}

/// What a status change does to the reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderTransition {
    /// Funds held in `total_orders` are released.
    Release,
    /// A released order becomes active again; funds are re-held.
    Reactivate,
}

/// Classify a transition by whether it crosses the `cancelled` boundary.
/// Expects statuses already normalized to lowercase.
fn plan_status_change(old: &str, new: &str) -> Result<OrderTransition, LedgerError> {
    if old == new {
        return Err(LedgerError::NoOpTransition(old.to_string()));
    }

    if new == CANCELLED {
        Ok(OrderTransition::Release)
    } else if old == CANCELLED {
        Ok(OrderTransition::Reactivate)
    } else {
        Err(LedgerError::UnsupportedTransition {
            from: old.to_string(),
            to: new.to_string(),
        })
    }
}
