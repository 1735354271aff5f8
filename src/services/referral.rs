//! Referral service - credits referral commissions and reverses them when
//! the referring action falls through.

use crate::{
    db::DbPool,
    error::LedgerError,
    models::{
        account::BalanceChange,
        audit::RequestContext,
        transaction::TransactionType,
    },
    services::posting::{self, LedgerEntry, LedgerReceipt, merge_metadata},
};
use serde_json::{Value, json};
use uuid::Uuid;

/// Credit a referral commission to a user's earnings.
///
/// Identical shape to the cashback credit path, recorded as
/// Transaction(`referral`, +amount).
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative
/// - `AccountNotFound`: the user has no account row
pub async fn add_referral_commission(
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
        transaction_type: TransactionType::Referral,
        amount_cents,
        reference_id,
        event_type: "referral_commission_added",
        event_data: json!({
            "user_id": user_id,
            "amount_cents": amount_cents,
            "reference_id": reference_id,
            "metadata": metadata,
        }),
        action: "add_referral_commission",
        resource_type: "referral",
        change: BalanceChange {
            earned_cents: amount_cents,
            ..Default::default()
        },
        required_available_cents: None,
        metadata,
    };

    posting::post_entry(pool, entry, ctx).await
}

/// Reverse a previously granted referral commission.
///
/// Commissions may be reversed after the referring action (e.g. an order)
/// is itself reversed. The subtraction from `total_earned` floors at zero:
/// if the reversal exceeds what remains, it is capped. The floor protects
/// against double-reversal or stale data producing a negative balance; it
/// is not a proportional rollback.
///
/// # Effect
///
/// Appends Transaction(`referral_reversed`, -amount) with `reason` folded
/// into its metadata, and subtracts the amount from `total_earned`.
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative
/// - `AccountNotFound`: the user has no account row
pub async fn reverse_referral_commission(
    pool: &DbPool,
    user_id: Uuid,
    amount_cents: i64,
    reference_id: Uuid,
    reason: &str,
    metadata: Option<Value>,
    ctx: &RequestContext,
) -> Result<LedgerReceipt, LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount);
    }

    let metadata = merge_metadata(metadata, json!({ "reason": reason }));

    let entry = LedgerEntry {
        user_id,
        transaction_type: TransactionType::ReferralReversed,
        amount_cents: -amount_cents,
        reference_id,
        event_type: "referral_commission_reversed",
        event_data: json!({
            "user_id": user_id,
            "amount_cents": amount_cents,
            "reference_id": reference_id,
            "reason": reason,
        }),
        action: "reverse_referral_commission",
        resource_type: "referral",
        change: BalanceChange {
            earned_cents: -amount_cents,
            ..Default::default()
        },
        required_available_cents: None,
        metadata: Some(metadata),
    };

    posting::post_entry(pool, entry, ctx).await
}
