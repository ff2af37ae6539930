//! Checkout session store port.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::billing::{CheckoutSession, CheckoutSessionStatus};
use crate::domain::foundation::{CheckoutSessionId, DomainError};

/// Store port for checkout sessions.
///
/// Sessions are created by the marketplace purchase flow; this subsystem
/// only reads them and transitions their status. Implementations must make
/// `update_status` persist the raw callback payload alongside the status
/// for audit.
#[async_trait]
pub trait CheckoutSessionStore: Send + Sync {
    /// Find a session by its id.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(
        &self,
        id: &CheckoutSessionId,
    ) -> Result<Option<CheckoutSession>, DomainError>;

    /// Transition a session's status, persisting the raw callback payload.
    async fn update_status(
        &self,
        id: &CheckoutSessionId,
        status: CheckoutSessionStatus,
        raw_payload: &Value,
    ) -> Result<(), DomainError>;
}
