//! HTTP middleware components.
//!
//! Middleware run before route handlers; here that is API key
//! authentication of the calling collaborator service.

/// API key authentication middleware
pub mod auth;
