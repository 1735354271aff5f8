//! Order reservation HTTP handlers.
//!
//! - POST /api/v1/orders - reserve funds against a store order
//! - POST /api/v1/orders/status - release or re-reserve across the
//!   `cancelled` boundary

use crate::{
    db::DbPool,
    error::LedgerError,
    middleware::auth::AuthContext,
    models::{
        audit::RequestContext,
        transaction::{ReserveRequest, StatusChangeRequest},
    },
    services::{order, posting::LedgerReceipt},
};
use axum::{Extension, Json, extract::State, http::HeaderMap};

/// Reserve funds against a store order.
///
/// # Validation
///
/// - Amount must be positive
/// - Available balance must cover the amount (422 otherwise)
pub async fn create_order(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(request): Json<ReserveRequest>,
) -> Result<Json<LedgerReceipt>, LedgerError> {
    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount_cents = request.amount_cents,
        "order reservation requested"
    );

    let ctx = RequestContext::from_headers(&headers);
    let receipt = order::create_order(
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

/// Change an order's status across the `cancelled` boundary.
///
/// Cancelling releases the reservation; un-cancelling re-reserves and
/// re-checks the available balance at that moment.
///
/// # Errors
///
/// - **409**: old and new status are identical
/// - **422**: neither status is `cancelled`, or reactivation exceeds the
///   available balance
pub async fn change_order_status(
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
        "order status change requested"
    );

    let ctx = RequestContext::from_headers(&headers);
    let receipt = order::change_order_status(
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
