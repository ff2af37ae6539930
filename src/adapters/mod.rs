//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//!
//! - `http` - axum handlers/routes for the webhook endpoint
//! - `postgres` - sqlx implementations of the transactional stores
//! - `grants` - HTTP client for the apply-entitlements collaborator

pub mod grants;
pub mod http;
pub mod postgres;
