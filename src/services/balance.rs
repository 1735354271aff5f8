//! Balance service - read-only account queries plus idempotent provisioning.
//!
//! No side effects on the running totals; the four mutating services are the
//! only writers of the account row.

use crate::{
    db::DbPool,
    error::LedgerError,
    models::{
        account::{Account, BalanceSummary},
        transaction::LedgerTransaction,
    },
};
use uuid::Uuid;

/// Default page size for transaction history.
const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Fetch the raw account row for a user.
///
/// # Errors
///
/// - `AccountNotFound`: no row exists for the user
pub async fn get_account(pool: &DbPool, user_id: Uuid) -> Result<Account, LedgerError> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(LedgerError::AccountNotFound)
}

/// Fetch the four totals plus the derived available balance.
///
/// The derived amount is `max(0, earned - withdrawn - pending - orders)`;
/// it can never be negative.
pub async fn get_available_balance(
    pool: &DbPool,
    user_id: Uuid,
) -> Result<BalanceSummary, LedgerError> {
    let account = get_account(pool, user_id).await?;
    Ok(account.into())
}

/// Provision the account row for a user, idempotently.
///
/// Safe to call any number of times: the first call inserts a zeroed row,
/// later calls leave the existing totals untouched and return the current
/// row.
pub async fn ensure_account(pool: &DbPool, user_id: Uuid) -> Result<Account, LedgerError> {
    sqlx::query("INSERT INTO accounts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;

    get_account(pool, user_id).await
}

/// Fetch a user's transaction history, newest first.
pub async fn list_transactions(
    pool: &DbPool,
    user_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<LedgerTransaction>, LedgerError> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 1000);

    let transactions = sqlx::query_as::<_, LedgerTransaction>(
        r#"
        SELECT * FROM transactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}
