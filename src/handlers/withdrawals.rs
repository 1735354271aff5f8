//! Withdrawal HTTP handlers.
//!
//! - POST /api/v1/withdrawals - reserve funds for a withdrawal request
//! - POST /api/v1/withdrawals/status - settle a withdrawal
//!   (`processing -> completed | cancelled`)

use crate::{
    db::DbPool,
    error::LedgerError,
    middleware::auth::AuthContext,
    models::{
        audit::RequestContext,
        transaction::{ReserveRequest, StatusChangeRequest},
    },
    services::{posting::LedgerReceipt, withdrawal},
};
use axum::{Extension, Json, extract::State, http::HeaderMap};

/// Create a withdrawal reservation.
///
/// # Validation
///
/// - Amount must be positive
/// - Available balance must cover the amount (422 otherwise)
pub async fn create_withdrawal(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(request): Json<ReserveRequest>,
) -> Result<Json<LedgerReceipt>, LedgerError> {
    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount_cents = request.amount_cents,
        "withdrawal requested"
    );

    let ctx = RequestContext::from_headers(&headers);
    let receipt = withdrawal::create_withdrawal(
        &pool,
        request.user_id,
        request.amount_cents,
        request.reference_id,
        request.metadata,
        &ctx,
    )
    .await?;

    Ok(Json(receipt))
}

/// Settle a withdrawal's status.
///
/// # Request Body
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
/// # Errors
///
/// - **409**: old and new status are identical
/// - **422**: a transition pair the ledger does not apply
pub async fn change_withdrawal_status(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<LedgerReceipt>, LedgerError> {
    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        old_status = %request.old_status,
        new_status = %request.new_status,
        "withdrawal status change requested"
    );

    let ctx = RequestContext::from_headers(&headers);
    let receipt = withdrawal::change_withdrawal_status(
        &pool,
        request.user_id,
        request.reference_id,
        &request.old_status,
        &request.new_status,
        request.amount_cents,
        request.metadata,
        &ctx,
    )
    .await?;

    Ok(Json(receipt))
}
