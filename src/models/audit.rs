//! Audit log model and per-request audit context.
//!
//! Events describe what happened; audit logs describe what the account
//! looked like before and after. This is the compliance trail.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents an audit log record from the database.
///
/// Maps to the `audit_logs` table. Exactly one row is written per mutation,
/// inside the same database transaction as the mutation itself.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AuditLog {
    /// Unique identifier for this audit entry
    pub id: Uuid,

    /// Account owner the mutation applied to
    pub user_id: Uuid,

    /// The operation performed, e.g. `create_withdrawal`
    pub action: String,

    /// The kind of external entity behind the mutation
    /// (`cashback`, `referral`, `withdrawal`, `order`)
    pub resource_type: String,

    /// Id of that external entity (the transaction's `reference_id`)
    pub resource_id: Uuid,

    /// Account snapshot before the mutation (JSON)
    pub before: serde_json::Value,

    /// Account snapshot after the mutation (JSON)
    pub after: serde_json::Value,

    /// Source address of the request, when known
    pub ip_address: Option<String>,

    /// User agent of the request, when known
    pub user_agent: Option<String>,

    /// When the mutation was recorded
    pub created_at: DateTime<Utc>,
}

/// Request-scoped context captured into audit logs.
///
/// Handlers build this from the incoming headers; callers invoking the
/// services directly (jobs, tests) use [`RequestContext::default`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Capture audit context from request headers.
    ///
    /// The source address is taken from `X-Forwarded-For` (first hop), which
    /// the platform's edge proxy sets.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        Self {
            ip_address,
            user_agent,
        }
    }
}
