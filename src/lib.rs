//! Ledger for a cashback/referral platform.
//!
//! Tracks how much money each user has earned, withdrawn, spent, and is
//! owed, and records every balance-affecting event in an auditable,
//! internally consistent way. One account per user carries four running
//! totals (earned, withdrawn, pending withdrawals, order reservations);
//! the derived available balance is always non-negative.
//!
//! Every mutation appends a transaction record, an immutable event, and an
//! audit log entry, and updates the account totals, all inside a single
//! database transaction with a per-account row lock (see
//! [`services::posting`]).
//!
//! The crate is a library; `main.rs` hosts it behind an authenticated HTTP
//! surface for the platform's collaborator services.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
