//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: the per-user row of running monetary totals
//! - `AccountTotals` / `BalanceChange`: the pure arithmetic behind every
//!   balance mutation
//! - `BalanceSummary`: response body with the derived available balance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table: exactly one row per user, holding four
/// running totals. The row is only ever updated by the ledger services,
/// never deleted.
///
/// # Balance Storage
///
/// All amounts are stored as `i64` cents to avoid floating-point precision
/// issues. $10.50 is stored as 1050 cents.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Owner key. Supplied by the external collaborators; the ledger does
    /// not know anything else about the user.
    pub user_id: Uuid,

    /// Lifetime cashback and referral earnings, in cents.
    pub total_earned_cents: i64,

    /// Sum of completed withdrawals, in cents.
    pub total_withdrawn_cents: i64,

    /// Funds held by withdrawals still in `processing`, in cents.
    pub total_pending_withdrawals_cents: i64,

    /// Funds reserved against active store orders, in cents.
    pub total_orders_cents: i64,

    /// Timestamp when the account row was provisioned.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last balance update.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// The four running totals as a plain value type.
    pub fn totals(&self) -> AccountTotals {
        AccountTotals {
            earned_cents: self.total_earned_cents,
            withdrawn_cents: self.total_withdrawn_cents,
            pending_withdrawals_cents: self.total_pending_withdrawals_cents,
            orders_cents: self.total_orders_cents,
        }
    }

    /// Derived spendable amount, clamped at zero.
    pub fn available_balance_cents(&self) -> i64 {
        self.totals().available_balance_cents()
    }

    /// JSON snapshot of the totals, as recorded in audit log before/after
    /// columns.
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "user_id": self.user_id,
            "total_earned_cents": self.total_earned_cents,
            "total_withdrawn_cents": self.total_withdrawn_cents,
            "total_pending_withdrawals_cents": self.total_pending_withdrawals_cents,
            "total_orders_cents": self.total_orders_cents,
        })
    }
}

/// The four running totals of an account, detached from the row metadata.
///
/// Invariant: every field is non-negative. [`BalanceChange::applied_to`]
/// floors each resulting total at zero, and the database CHECK constraints
/// back the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountTotals {
    pub earned_cents: i64,
    pub withdrawn_cents: i64,
    pub pending_withdrawals_cents: i64,
    pub orders_cents: i64,
}

impl AccountTotals {
    /// `max(0, earned - withdrawn - pending - orders)`.
    pub fn available_balance_cents(&self) -> i64 {
        (self.earned_cents
            - self.withdrawn_cents
            - self.pending_withdrawals_cents
            - self.orders_cents)
            .max(0)
    }
}

/// Signed deltas against the four running totals.
///
/// Each ledger operation is expressed as one `BalanceChange`; applying it
/// never drives a total below zero. The floor is deliberate: a referral
/// reversal larger than the remaining earnings is capped, and releasing a
/// reservation twice cannot push a bucket negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceChange {
    pub earned_cents: i64,
    pub withdrawn_cents: i64,
    pub pending_withdrawals_cents: i64,
    pub orders_cents: i64,
}

impl BalanceChange {
    /// Apply the deltas to a set of totals, flooring every result at zero.
    pub fn applied_to(&self, totals: AccountTotals) -> AccountTotals {
        AccountTotals {
            earned_cents: (totals.earned_cents + self.earned_cents).max(0),
            withdrawn_cents: (totals.withdrawn_cents + self.withdrawn_cents).max(0),
            pending_withdrawals_cents: (totals.pending_withdrawals_cents
                + self.pending_withdrawals_cents)
                .max(0),
            orders_cents: (totals.orders_cents + self.orders_cents).max(0),
        }
    }
}

/// Request body for provisioning an account.
///
/// # JSON Example
///
/// ```json
/// { "user_id": "550e8400-e29b-41d4-a716-446655440000" }
/// ```
///
/// Provisioning is idempotent; repeated calls return the existing row.
#[derive(Debug, Deserialize)]
pub struct EnsureAccountRequest {
    pub user_id: Uuid,
}

/// Response body for the balance endpoint.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "total_earned_cents": 15000,
///   "total_withdrawn_cents": 5000,
///   "total_pending_withdrawals_cents": 0,
///   "total_orders_cents": 2500,
///   "available_balance_cents": 7500
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct BalanceSummary {
    pub user_id: Uuid,
    pub total_earned_cents: i64,
    pub total_withdrawn_cents: i64,
    pub total_pending_withdrawals_cents: i64,
    pub total_orders_cents: i64,

    /// Derived, clamped at zero.
    pub available_balance_cents: i64,
}

impl From<Account> for BalanceSummary {
    fn from(account: Account) -> Self {
        let available_balance_cents = account.available_balance_cents();
        Self {
            user_id: account.user_id,
            total_earned_cents: account.total_earned_cents,
            total_withdrawn_cents: account.total_withdrawn_cents,
            total_pending_withdrawals_cents: account.total_pending_withdrawals_cents,
            total_orders_cents: account.total_orders_cents,
            available_balance_cents,
        }
    }
}
