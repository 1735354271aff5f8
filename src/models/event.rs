//! Immutable event model.
//!
//! One event exists per transaction, carrying a structured snapshot of the
//! inputs that produced it. Events let the full business narrative be
//! reconstructed without parsing the free-form `metadata` on transactions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents an immutable event record from the database.
///
/// Maps to the `immutable_events` table. Append-only, like transactions.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ImmutableEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// The transaction this event narrates (exactly one event per
    /// transaction)
    pub transaction_id: Uuid,

    /// Event kind, e.g. `withdrawal_status_changed`
    pub event_type: String,

    /// Structured snapshot of the operation inputs (JSON)
    pub event_data: serde_json::Value,

    /// When the event was recorded
    pub created_at: DateTime<Utc>,
}
