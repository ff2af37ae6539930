//! Checkout session model and status machine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{CheckoutSessionId, PriceId, Timestamp, UserId};

use super::provider::Provider;

/// Lifecycle of a tracked purchase attempt.
///
/// `Success` and `Failed` are terminal for provider-driven transitions;
/// re-entering the same terminal state is an idempotent no-op (gateways
/// redeliver), while a conflicting transition requires an operator override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutSessionStatus {
    Started,
    Pending,
    Success,
    Failed,
}

impl CheckoutSessionStatus {
    /// True for the terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutSessionStatus::Success | CheckoutSessionStatus::Failed)
    }

    /// Whether a provider callback may move the session to `target`.
    pub fn accepts_provider_transition(&self, target: CheckoutSessionStatus) -> bool {
        if self.is_terminal() {
            *self == target
        } else {
            matches!(
                target,
                CheckoutSessionStatus::Success
                    | CheckoutSessionStatus::Failed
                    | CheckoutSessionStatus::Pending
            )
        }
    }
}

/// A tracked purchase attempt linking a user, a price, and a gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: CheckoutSessionId,
    pub provider: Provider,
    pub price_id: PriceId,
    pub user_id: UserId,
    pub status: CheckoutSessionStatus,
    /// Raw payload of the most recent gateway callback, kept for audit.
    pub last_callback_payload: Option<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CheckoutSession {
    /// Creates a new session at the start of a purchase flow.
    pub fn new(
        id: CheckoutSessionId,
        provider: Provider,
        price_id: PriceId,
        user_id: UserId,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            provider,
            price_id,
            user_id,
            status: CheckoutSessionStatus::Started,
            last_callback_payload: None,
            created_at: now,
            updated_at: now,
        }
    }
}
