//! HTTP request handlers (route handlers).
//!
//! Each handler deserializes the request, captures the audit context from
//! headers where the operation mutates the ledger, delegates to a service,
//! and returns the composite receipt as JSON.

/// Account provisioning and read endpoints
pub mod accounts;
/// Cashback credit endpoint
pub mod cashback;
/// Health check endpoint
pub mod health;
/// Order reservation endpoints
pub mod orders;
/// Referral commission endpoints
pub mod referrals;
/// Withdrawal endpoints
pub mod withdrawals;
