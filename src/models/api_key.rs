//! API key model for authenticating collaborator services.
//!
//! The ledger's callers are the platform's internal services (cashback
//! tracker, referral engine, storefront, payout processor). Each holds an
//! API key, stored in the database as a SHA-256 hash.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents an API key record from the database.
///
/// Maps to the `api_keys` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    /// Unique identifier for this API key
    pub id: Uuid,

    /// SHA-256 hash of the actual API key (64 hex characters)
    pub key_hash: String,

    /// Name of the collaborator service using this key
    pub service_name: String,

    /// Timestamp when this API key was created
    pub created_at: DateTime<Utc>,

    /// Whether this key is currently active. Inactive keys are rejected,
    /// which revokes access without deleting the record.
    pub is_active: bool,
}
