//! Account read and provisioning HTTP handlers.
//!
//! This module implements:
//! - POST /api/v1/accounts - provision an account (idempotent)
//! - GET /api/v1/accounts/:user_id - raw totals
//! - GET /api/v1/accounts/:user_id/balance - totals plus derived available
//!   balance
//! - GET /api/v1/accounts/:user_id/transactions - history, newest first

use crate::{
    db::DbPool,
    error::LedgerError,
    middleware::auth::AuthContext,
    models::{
        account::{Account, BalanceSummary, EnsureAccountRequest},
        transaction::{HistoryParams, LedgerTransaction},
    },
    services::balance,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

/// Provision the account row for a user.
///
/// # Endpoint
///
/// `POST /api/v1/accounts`
///
/// Idempotent: the first call inserts a zeroed row, repeated calls return
/// the existing row unchanged. Collaborators call this during user
/// registration, before the first credit.
///
/// # Response
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "total_earned_cents": 0,
///   "total_withdrawn_cents": 0,
///   "total_pending_withdrawals_cents": 0,
///   "total_orders_cents": 0,
///   "created_at": "2026-01-12T10:00:00Z",
///   "updated_at": "2026-01-12T10:00:00Z"
/// }
/// ```
pub async fn ensure_account(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<EnsureAccountRequest>,
) -> Result<Json<Account>, LedgerError> {
    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        "account provisioning requested"
    );

    let account = balance::ensure_account(&pool, request.user_id).await?;
    Ok(Json(account))
}

/// Get the raw account row for a user.
///
/// # Endpoint
///
/// `GET /api/v1/accounts/{user_id}`
///
/// # Response
///
/// - **Success (200 OK)**: the four running totals
/// - **Error (404)**: no account row for the user
pub async fn get_account(
    State(pool): State<DbPool>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Account>, LedgerError> {
    let account = balance::get_account(&pool, user_id).await?;
    Ok(Json(account))
}

/// Get the derived available balance for a user.
///
/// # Endpoint
///
/// `GET /api/v1/accounts/{user_id}/balance`
///
/// # Response (200 OK)
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
pub async fn get_balance(
    State(pool): State<DbPool>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceSummary>, LedgerError> {
    let summary = balance::get_available_balance(&pool, user_id).await?;
    Ok(Json(summary))
}

/// List a user's transactions, newest first.
///
/// # Endpoint
///
/// `GET /api/v1/accounts/{user_id}/transactions?limit=50`
pub async fn list_transactions(
    State(pool): State<DbPool>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<LedgerTransaction>>, LedgerError> {
    let transactions = balance::list_transactions(&pool, user_id, params.limit).await?;
    Ok(Json(transactions))
}
