//! Gigline Billing - Reconciliation & Entitlement Ledger
//!
//! This crate implements the billing core of the Gigline marketplace:
//! gateway webhook reconciliation with exactly-once payment settlement,
//! and a concurrency-safe expiring credit ledger.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
