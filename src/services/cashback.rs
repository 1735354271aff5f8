//! Cashback service - credits a user's earnings when a cashback event
//! occurs.

use crate::{
    db::DbPool,
    error::LedgerError,
    models::{
        account::BalanceChange,
        audit::RequestContext,
        transaction::TransactionType,
    },
    services::posting::{self, LedgerEntry, LedgerReceipt},
};
use serde_json::{Value, json};
use uuid::Uuid;

/// Credit a cashback amount to a user's earnings.
///
/// # Effect
///
/// Appends Transaction(`cashback`, +amount) with its event and audit log,
/// and adds the amount to `total_earned`. Crediting never threatens the
/// non-negative invariant, so there is no balance check.
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative (nothing written)
/// - `AccountNotFound`: the user has no account row
pub async fn add_cashback(
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
        transaction_type: TransactionType::Cashback,
        amount_cents,
        reference_id,
        event_type: "cashback_credited",
        event_data: json!({
            "user_id": user_id,
            "amount_cents": amount_cents,
            "reference_id": reference_id,
            "metadata": metadata,
        }),
        action: "add_cashback",
        resource_type: "cashback",
        change: BalanceChange {
            earned_cents: amount_cents,
            ..Default::default()
        },
        required_available_cents: None,
        metadata,
    };

    posting::post_entry(pool, entry, ctx).await
}
