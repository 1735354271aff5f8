//! Withdrawal service - moves money between the earned, pending-withdrawal,
//! and withdrawn buckets.
//!
//! # State machine
//!
//! `processing -> completed` and `processing -> cancelled`, both terminal.
//! The ledger applies exactly those two transitions; it does not store the
//! withdrawal itself (the payout processor owns that entity and passes its
//! id as `reference_id`).

use crate::{
    db::DbPool,
    error::LedgerError,
    models::{
        account::BalanceChange,
        audit::RequestContext,
        transaction::{TransactionType, WithdrawalStatus},
    },
    services::posting::{self, LedgerEntry, LedgerReceipt, merge_metadata},
};
use serde_json::{Value, json};
use uuid::Uuid;

/// Reserve funds for a new withdrawal request.
///
/// # Effect
///
/// Appends Transaction(`withdrawal_processing`, -amount) and moves the
/// amount into `total_pending_withdrawals`.
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative
/// - `InsufficientBalance`: available balance below the requested amount,
///   checked against the row lock so concurrent requests cannot jointly
///   overdraw
/// - `AccountNotFound`: the user has no account row
pub async fn create_withdrawal(
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
        transaction_type: TransactionType::WithdrawalProcessing,
        amount_cents: -amount_cents,
        reference_id,
        event_type: "withdrawal_created",
        event_data: json!({
            "user_id": user_id,
            "amount_cents": amount_cents,
            "reference_id": reference_id,
            "status": WithdrawalStatus::Processing.as_str(),
            "metadata": metadata,
        }),
        action: "create_withdrawal",
        resource_type: "withdrawal",
        change: BalanceChange {
            pending_withdrawals_cents: amount_cents,
            ..Default::default()
        },
        required_available_cents: Some(amount_cents),
        metadata,
    };

    posting::post_entry(pool, entry, ctx).await
}

/// Move a withdrawal to a new status and settle the held funds.
///
/// `amount_cents` is the amount originally reserved; the recorded
/// transaction is a status marker with amount zero.
///
/// # Transitions
///
/// - `processing -> completed`: pending decreases by the amount (floor 0),
///   withdrawn increases by the amount
/// - `processing -> cancelled`: pending decreases by the amount (floor 0),
///   withdrawn unchanged
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative
/// - `InvalidRequest`: a status string the ledger does not know
/// - `NoOpTransition`: old and new status are identical
/// - `UnsupportedTransition`: any pair other than the two listed (e.g.
///   `completed -> cancelled`)
pub async fn change_withdrawal_status(
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

    let old = parse_status(old_status)?;
    let new = parse_status(new_status)?;
    let (transaction_type, change) = plan_transition(old, new, amount_cents)?;

    let metadata = merge_metadata(
        metadata,
        json!({
            "old_status": old.as_str(),
            "new_status": new.as_str(),
            "withdrawal_amount_cents": amount_cents,
        }),
    );

    let entry = LedgerEntry {
        user_id,
        transaction_type,
        // Status markers move money between buckets without changing the
        // recorded amount.
        amount_cents: 0,
        reference_id,
        event_type: "withdrawal_status_changed",
        event_data: json!({
            "user_id": user_id,
            "reference_id": reference_id,
            "old_status": old.as_str(),
            "new_status": new.as_str(),
            "amount_cents": amount_cents,
        }),
        action: "change_withdrawal_status",
        resource_type: "withdrawal",
        change,
        required_available_cents: None,
        metadata: Some(metadata),
    };

    posting::post_entry(pool, entry, ctx).await
}

fn parse_status(status: &str) -> Result<WithdrawalStatus, LedgerError> {
    status.parse().map_err(|_| {
        LedgerError::InvalidRequest(format!("unknown withdrawal status '{status}'"))
    })
}

/// Decide what a transition does, without touching the database.
fn plan_transition(
    old: WithdrawalStatus,
    new: WithdrawalStatus,
    amount_cents: i64,
) -> Result<(TransactionType, BalanceChange), LedgerError> {
    if old == new {
        return Err(LedgerError::NoOpTransition(old.as_str().to_string()));
    }

    match (old, new) {
        (WithdrawalStatus::Processing, WithdrawalStatus::Completed) => Ok((
            TransactionType::WithdrawalCompleted,
            BalanceChange {
                pending_withdrawals_cents: -amount_cents,
                withdrawn_cents: amount_cents,
                ..Default::default()
            },
        )),
        (WithdrawalStatus::Processing, WithdrawalStatus::Cancelled) => Ok((
            TransactionType::WithdrawalCancelled,
            BalanceChange {
                pending_withdrawals_cents: -amount_cents,
                ..Default::default()
            },
        )),
        (old, new) => Err(LedgerError::UnsupportedTransition {
            from: old.as_str().to_string(),
            to: new.as_str().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completing_moves_pending_into_withdrawn() {
        let (transaction_type, change) = plan_transition(
            WithdrawalStatus::Processing,
            WithdrawalStatus::Completed,
            20_000,
        )
        .unwrap();

        assert_eq!(transaction_type, TransactionType::WithdrawalCompleted);
        assert_eq!(change.pending_withdrawals_cents, -20_000);
        assert_eq!(change.withdrawn_cents, 20_000);
        assert_eq!(change.earned_cents, 0);
    }

    #[test]
    fn cancelling_only_releases_pending() {
        let (transaction_type, change) = plan_transition(
            WithdrawalStatus::Processing,
            WithdrawalStatus::Cancelled,
            20_000,
        )
        .unwrap();

        assert_eq!(transaction_type, TransactionType::WithdrawalCancelled);
        assert_eq!(change.pending_withdrawals_cents, -20_000);
        assert_eq!(change.withdrawn_cents, 0);
    }

    #[test]
    fn repeating_a_status_is_a_no_op() {
        let err = plan_transition(
            WithdrawalStatus::Completed,
            WithdrawalStatus::Completed,
            20_000,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::NoOpTransition(_)));
    }

    #[test]
    fn leaving_a_terminal_state_is_rejected() {
        for (old, new) in [
            (WithdrawalStatus::Completed, WithdrawalStatus::Cancelled),
            (WithdrawalStatus::Completed, WithdrawalStatus::Processing),
            (WithdrawalStatus::Cancelled, WithdrawalStatus::Processing),
            (WithdrawalStatus::Cancelled, WithdrawalStatus::Completed),
        ] {
            let err = plan_transition(old, new, 1_000).unwrap_err();
            assert!(matches!(err, LedgerError::UnsupportedTransition { .. }));
        }
    }
}
