//! Data models representing database entities.
//!
//! This module contains all data structures that map to the ledger's tables,
//! plus the API request/response types.

/// API key authentication model
pub mod api_key;
/// Per-user account with the four running totals
pub mod account;
/// Audit log (before/after account snapshots)
pub mod audit;
/// Immutable event (structured operation snapshot)
pub mod event;
/// Append-only transaction record and status types
pub mod transaction;
