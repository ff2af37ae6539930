//! Command handlers and services, grouped by subsystem.

pub mod billing;
pub mod entitlement;
