//! Entitlement application collaborator port.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::{PaymentId, PriceId, UserId};

/// Request to apply the entitlements a paid price grants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub user_id: UserId,
    pub price_id: PriceId,
    pub payment_id: PaymentId,
}

/// Failure applying entitlements.
///
/// By the time this can occur the payment is already durably marked paid,
/// so the reconciler logs it and moves on; the external reconciliation
/// sweep re-invokes `apply` later.
#[derive(Debug, Error)]
pub enum GrantError {
    #[error("Entitlement application failed: {0}")]
    Failed(String),
}

/// Port for the external rule that decides *what* a paid price grants.
///
/// The implementation is at-least-once-safe by contract (idempotent on its
/// own side); the reconciler guarantees it is *invoked* exactly once per
/// distinct paid transaction, and never retries it itself.
#[async_trait]
pub trait EntitlementGranter: Send + Sync {
    /// Apply entitlements for a settled payment.
    async fn apply(&self, request: GrantRequest) -> Result<(), GrantError>;
}
