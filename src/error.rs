//! Error types and HTTP error response handling.
//!
//! This module defines the ledger error taxonomy and how each error is
//! converted into an HTTP response with an appropriate status code and JSON
//! body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Validation errors (`InvalidAmount`, `InsufficientBalance`,
/// `NoOpTransition`, `UnsupportedTransition`) are detected before any write
/// and returned directly; there is never anything to roll back for them.
/// `Persistence` wraps any sqlx error raised after validation has passed.
/// Because every mutation runs inside a single database transaction, a
/// persistence failure mid-sequence aborts the whole write and no partial
/// credit or debit is ever visible.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A step of the write sequence failed after validation passed.
    ///
    /// Wraps any sqlx::Error via `#[from]`. The enclosing database
    /// transaction is rolled back, so no orphaned transaction or event row
    /// can remain.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// API key is missing, invalid, or inactive.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// No account row exists for the requested user.
    ///
    /// Account provisioning is the caller's responsibility (see
    /// `services::balance::ensure_account`). Returns HTTP 404 Not Found.
    #[error("Account not found")]
    AccountNotFound,

    /// The requested amount is zero or negative.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Amount must be positive")]
    InvalidAmount,

    /// Available balance is below the requested withdrawal, order, or
    /// reactivation amount.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// A status change request where old and new status are identical.
    ///
    /// Returns HTTP 409 Conflict. The String carries the repeated status.
    #[error("Status is already '{0}'")]
    NoOpTransition(String),

    /// A status transition pair the ledger does not apply.
    ///
    /// Withdrawals only move `processing -> completed` and
    /// `processing -> cancelled`; orders only move into or out of
    /// `cancelled`. Returns HTTP 422 Unprocessable Entity.
    #[error("Unsupported status transition '{from}' -> '{to}'")]
    UnsupportedTransition { from: String, to: String },

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request. The String contains details.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert LedgerError into an HTTP response.
///
/// Handlers return `Result<T, LedgerError>` and errors are rendered as:
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            LedgerError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                self.to_string(),
            ),
            LedgerError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            LedgerError::InvalidAmount => {
                (StatusCode::BAD_REQUEST, "invalid_amount", self.to_string())
            }
            LedgerError::InsufficientBalance => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                self.to_string(),
            ),
            LedgerError::NoOpTransition(_) => {
                (StatusCode::CONFLICT, "no_op_transition", self.to_string())
            }
            LedgerError::UnsupportedTransition { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unsupported_transition",
                self.to_string(),
            ),
            LedgerError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            // Hide persistence details from clients
            LedgerError::Persistence(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "persistence_failure",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
