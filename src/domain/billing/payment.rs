//! Payment and invoice models.
//!
//! A payment row is uniquely identified by `(provider, provider_ref)`; that
//! pair is the idempotency key for the whole reconciliation pipeline.
//! Invoices are one-to-one with payments and written in the same
//! transaction.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CheckoutSessionId, InvoiceId, PaymentId, Timestamp, UserId,
};

use super::provider::Provider;

/// Settlement state of a payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
    RefundedPartial,
}

/// A settled (or attempted) gateway transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub checkout_session_id: CheckoutSessionId,
    pub provider: Provider,
    /// The gateway's settlement reference; unique together with `provider`.
    pub provider_ref: String,
    /// The gateway's own transaction identifier, kept for support lookups.
    pub external_id: String,
    /// Amount in the currency's smallest unit.
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Invoice state, mirroring its payment's paid/void state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Paid,
    Void,
}

/// Accounting record, one per payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub payment_id: PaymentId,
    pub total: i64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
