//! Cashback HTTP handler.
//!
//! - POST /api/v1/cashback - credit a cashback amount to a user's earnings

use crate::{
    db::DbPool,
    error::LedgerError,
    middleware::auth::AuthContext,
    models::{audit::RequestContext, transaction::CreditRequest},
    services::{cashback, posting::LedgerReceipt},
};
use axum::{Extension, Json, extract::State, http::HeaderMap};

/// Credit cashback earnings.
///
/// # Request Body
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "amount_cents": 2500,
///   "reference_id": "770e8400-e29b-41d4-a716-446655440002",
///   "metadata": { "store": "acme", "order_total_cents": 50000 }
/// }
/// ```
///
/// # Response (200 OK)
///
/// The composite receipt: transaction, immutable event, audit log, and the
/// updated account.
///
/// # Errors
///
/// - **400**: amount is zero or negative
/// - **404**: no account row for the user
pub async fn add_cashback(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(request): Json<CreditRequest>,
) -> Result<Json<LedgerReceipt>, LedgerError> {
    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount_cents = request.amount_cents,
        "cashback credit requested"
    );

    let ctx = RequestContext::from_headers(&headers);
    let receipt = cashback::add_cashback(
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
