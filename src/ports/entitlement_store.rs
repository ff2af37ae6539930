//! Entitlement ledger store ports.

use async_trait::async_trait;

use crate::domain::entitlement::{CreditBundle, CreditKind};
use crate::domain::foundation::{DomainError, EntitlementId, Timestamp, UserId};

/// Read port for point-in-time credit checks.
///
/// No locking: `has_credit` and `summarize` are snapshots and may be stale
/// by the time the caller acts on them. Only `consume` (via [`LedgerTx`])
/// is authoritative.
#[async_trait]
pub trait EntitlementReader: Send + Sync {
    /// All bundles of one kind held by a user, including expired and
    /// exhausted ones - classification is the domain's job.
    async fn bundles_for(
        &self,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<Vec<CreditBundle>, DomainError>;
}

/// Ambient-transaction handle for ledger writes.
///
/// `consume` runs inside the *caller's* business transaction ("publish this
/// job and spend one credit" is one atomic unit), so the ledger never opens
/// its own. Callers obtain a `LedgerTx` from their transaction and pass it
/// in; everything done through it commits or aborts with the caller.
#[async_trait]
pub trait LedgerTx: Send {
    /// Bundles of one kind for a user, read within this transaction.
    async fn bundles_for(
        &mut self,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<Vec<CreditBundle>, DomainError>;

    /// Conditionally decrement one credit from a bundle.
    ///
    /// The write must carry the guard
    /// `remaining_credits > 0 AND (expires_at IS NULL OR expires_at > now)`
    /// and return the affected-row count. Zero means a concurrent consumer
    /// drained the bundle after it was read.
    async fn decrement_if_available(
        &mut self,
        id: &EntitlementId,
        now: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Insert a new credit bundle.
    ///
    /// This is the only write path that increases credit; it is driven by
    /// entitlement-granting logic after a paid settlement.
    async fn grant(&mut self, bundle: &CreditBundle) -> Result<(), DomainError>;
}
