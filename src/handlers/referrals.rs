//! Referral commission HTTP handlers.
//!
//! - POST /api/v1/referrals - credit a referral commission
//! - POST /api/v1/referrals/reverse - reverse a previously granted
//!   commission

use crate::{
    db::DbPool,
    error::LedgerError,
    middleware::auth::AuthContext,
    models::{
        audit::RequestContext,
        transaction::{CreditRequest, ReversalRequest},
    },
    services::{posting::LedgerReceipt, referral},
};
use axum::{Extension, Json, extract::State, http::HeaderMap};

/// Credit a referral commission.
///
/// Same shape as the cashback credit; recorded with type `referral`.
pub async fn add_commission(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(request): Json<CreditRequest>,
) -> Result<Json<LedgerReceipt>, LedgerError> {
    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount_cents = request.amount_cents,
        "referral commission requested"
    );

    let ctx = RequestContext::from_headers(&headers);
    let receipt = referral::add_referral_commission(
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

/// Reverse a referral commission.
///
/// # Request Body
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "amount_cents": 2500,
///   "reference_id": "770e8400-e29b-41d4-a716-446655440002",
///   "reason": "referred order reversed"
/// }
/// ```
///
/// The subtraction from `total_earned` floors at zero; a reversal can never
/// drive the account negative.
pub async fn reverse_commission(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(request): Json<ReversalRequest>,
) -> Result<Json<LedgerReceipt>, LedgerError> {
    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount_cents = request.amount_cents,
        reason = %request.reason,
        "referral reversal requested"
    );

    let ctx = RequestContext::from_headers(&headers);
    let receipt = referral::reverse_referral_commission(
        &pool,
        request.user_id,
        request.amount_cents,
        request.reference_id,
        &request.reason,
        request.metadata,
        &ctx,
    )
    .await?;

    Ok(Json(receipt))
}
