//! Payment settlement port.
//!
//! The paid path of the webhook pipeline must be one ACID unit: read any
//! existing payment for `(provider, provider_ref)`, upsert payment and
//! invoice, transition the session, and compute the exactly-once gate from
//! state observed *inside* that same transaction. Splitting those steps
//! across ports would let a concurrent duplicate delivery observe a torn
//! intermediate state, so the whole unit sits behind one port call and the
//! adapter owns the transaction.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::billing::{CheckoutSession, GatewayEvent, Payment};
use crate::domain::foundation::DomainError;

use super::price_store::Price;

/// Everything the settlement transaction needs.
#[derive(Debug, Clone)]
pub struct SettlementCommand {
    pub session: CheckoutSession,
    pub price: Price,
    pub event: GatewayEvent,
    /// Raw callback payload, persisted on the session for audit.
    pub raw_payload: Value,
}

/// Result of a settlement transaction.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The payment row as settled by this transaction.
    pub payment: Payment,
    /// The exactly-once gate: true iff no payment for this
    /// `(provider, provider_ref)` was already marked paid before this
    /// transaction. Entitlements are applied only when this is true.
    pub should_apply_entitlements: bool,
}

/// Port for the single-transaction paid-path settlement.
///
/// Implementations must ensure:
/// - at most one payment row per `(provider, provider_ref)`
/// - invoice upserted in the same transaction, mirroring the payment
/// - session transitioned to `Success` with the raw payload persisted
/// - `should_apply_entitlements` computed from pre-transaction state read
///   under the same isolation as the writes
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Settle a paid gateway callback. Idempotent: redelivering the same
    /// callback converges on the same payment row with the gate closed.
    async fn settle(&self, command: SettlementCommand) -> Result<SettlementOutcome, DomainError>;
}
