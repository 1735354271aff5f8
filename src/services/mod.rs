//! Business logic services.
//!
//! Each mutating service validates its inputs, describes its effect as a
//! `posting::LedgerEntry`, and hands it to the shared atomic posting path.
//! The balance service only reads.

pub mod balance;
pub mod cashback;
pub mod order;
pub mod posting;
pub mod referral;
pub mod withdrawal;
