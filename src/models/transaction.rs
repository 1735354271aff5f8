//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `LedgerTransaction`: the append-only record of one balance-affecting
//!   action
//! - `TransactionType`: the eight recorded action kinds
//! - `WithdrawalStatus`: the withdrawal state machine's states
//! - Request types for the mutating API endpoints

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of action a transaction records.
///
/// Stored in the `transaction_type` column as its snake_case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    /// Cashback credit to `total_earned`.
    Cashback,
    /// Referral commission credit to `total_earned`.
    Referral,
    /// Compensating debit undoing a referral commission.
    ReferralReversed,
    /// Withdrawal created; funds moved into `total_pending_withdrawals`.
    WithdrawalProcessing,
    /// Withdrawal paid out; pending funds moved into `total_withdrawn`.
    WithdrawalCompleted,
    /// Withdrawal cancelled; pending funds released.
    WithdrawalCancelled,
    /// Order reservation taken against `total_orders`.
    OrderCreated,
    /// Order reservation released.
    OrderCancelled,
}

impl TransactionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionType::Cashback => "cashback",
            TransactionType::Referral => "referral",
            TransactionType::ReferralReversed => "referral_reversed",
            TransactionType::WithdrawalProcessing => "withdrawal_processing",
            TransactionType::WithdrawalCompleted => "withdrawal_completed",
            TransactionType::WithdrawalCancelled => "withdrawal_cancelled",
            TransactionType::OrderCreated => "order_created",
            TransactionType::OrderCancelled => "order_cancelled",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Rows are append-only: never updated,
/// never deleted. `amount_cents` is signed; credits are positive, debits
/// negative, and pure status-change markers zero.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LedgerTransaction {
    /// Unique identifier for this transaction
    pub id: Uuid,

    /// Account owner the transaction applies to
    pub user_id: Uuid,

    /// One of the eight [`TransactionType`] strings
    pub transaction_type: String,

    /// Signed amount in cents
    pub amount_cents: i64,

    /// Identifier of the external entity that caused this transaction
    /// (a cashback record, a withdrawal request, an order). The external
    /// collaborator owns that entity's lifecycle; the ledger records the id
    /// without a foreign key.
    pub reference_id: Uuid,

    /// Free-form key/value context supplied by the caller (JSON)
    pub metadata: Option<serde_json::Value>,

    /// When the transaction was recorded
    pub created_at: DateTime<Utc>,
}

/// States of the withdrawal state machine.
///
/// `processing` is the only non-terminal state; the ledger applies exactly
/// two transitions, `processing -> completed` and `processing -> cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalStatus {
    Processing,
    Completed,
    Cancelled,
}

impl WithdrawalStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" => Ok(WithdrawalStatus::Processing),
            "completed" => Ok(WithdrawalStatus::Completed),
            "cancelled" => Ok(WithdrawalStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// Request to credit earnings (cashback or referral commission).
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "amount_cents": 2500,
///   "reference_id": "770e8400-e29b-41d4-a716-446655440002",
///   "metadata": { "store": "acme" }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    /// Account owner to credit
    pub user_id: Uuid,

    /// Amount to add in cents (must be positive)
    pub amount_cents: i64,

    /// Id of the cashback record / referral commission being credited
    pub reference_id: Uuid,

    /// Optional free-form context, stored on the transaction
    pub metadata: Option<serde_json::Value>,
}

/// Request to reverse a previously granted referral commission.
#[derive(Debug, Deserialize)]
pub struct ReversalRequest {
    pub user_id: Uuid,

    /// Amount to take back in cents (must be positive). Capped at the
    /// remaining earnings; the account never goes negative.
    pub amount_cents: i64,

    /// Id of the commission being reversed
    pub reference_id: Uuid,

    /// Why the commission is being reversed (e.g. the referred order was
    /// itself reversed). Folded into the transaction metadata.
    pub reason: String,

    pub metadata: Option<serde_json::Value>,
}

/// Request to reserve funds (a withdrawal or a store order).
///
/// # Validation
///
/// - Amount must be positive
/// - Available balance must cover the amount
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub user_id: Uuid,

    /// Amount to reserve in cents
    pub amount_cents: i64,

    /// Id of the withdrawal request / order owning the reservation
    pub reference_id: Uuid,

    pub metadata: Option<serde_json::Value>,
}

/// Request to move a withdrawal or order to a new status.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "reference_id": "880e8400-e29b-41d4-a716-446655440003",
///   "old_status": "processing",
///   "new_status": "completed",
///   "amount_cents": 20000
/// }
/// ```
///
/// `amount_cents` is the amount originally reserved; the recorded
/// transaction carries amount zero (it is a status marker) and the ledger
/// uses this field to move funds between buckets.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub user_id: Uuid,
    pub reference_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub amount_cents: i64,
    pub metadata: Option<serde_json::Value>,
}

/// Query parameters for the transaction history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Maximum number of rows to return (newest first), default 100.
    pub limit: Option<i64>,
}
