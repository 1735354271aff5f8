//! API key authentication middleware.
//!
//! The ledger's HTTP surface is only reachable by the platform's own
//! collaborator services (cashback tracker, referral engine, storefront,
//! payout processor). Each presents an API key; this middleware:
//! 1. Extracts the key from the Authorization header
//! 2. Hashes it and verifies it exists in the database
//! 3. Injects the calling service's identity into the request
//! 4. Rejects unauthorized requests with HTTP 401

use crate::{db::DbPool, error::LedgerError, models::api_key::ApiKey};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it to know
/// which collaborator service made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated API key
    pub api_key_id: Uuid,

    /// Name of the collaborator service making the request
    pub service_name: String,
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <key>` header
/// 2. Hash the `<key>` using SHA-256
/// 3. Query for a matching active hash
/// 4. If found: inject [`AuthContext`], call the next handler
/// 5. If not found: return 401 Unauthorized
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, LedgerError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(LedgerError::InvalidApiKey)?;

    // Expected format: "Bearer <api_key>"
    let api_key = auth_header
        .strip_prefix("Bearer ")
        .ok_or(LedgerError::InvalidApiKey)?;

    // Keys are stored hashed; hash the presented key and look it up
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    let key_hash = hex::encode(hasher.finalize());

    let api_key_record = sqlx::query_as::<_, ApiKey>(
        "SELECT id, key_hash, service_name, created_at, is_active
         FROM api_keys
         WHERE key_hash = $1 AND is_active = true",
    )
    .bind(&key_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or(LedgerError::InvalidApiKey)?;

    let auth_context = AuthContext {
        api_key_id: api_key_record.id,
        service_name: api_key_record.service_name,
    };

    // Handlers extract this with Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}
