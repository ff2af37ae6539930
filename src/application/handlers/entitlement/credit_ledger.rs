//! CreditLedger - the entitlement consumption service.
//!
//! Feature code composes "spend one credit + perform the action" into one
//! atomic unit by passing its own transaction handle into [`CreditLedger::
//! consume`]. Safety under concurrent spenders comes from the conditional
//! decrement: the update carries a balance-and-window guard and reports
//! affected rows, so of two simultaneous consumers of the last credit
//! exactly one succeeds and the other observes zero rows and fails with a
//! typed, retryable-by-the-caller error. No row locks are held.

use std::sync::Arc;

use crate::domain::entitlement::{
    classify, summarize, CreditBundle, CreditKind, CreditStanding, CreditSummary,
    EntitlementError,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{EntitlementReader, LedgerTx};

/// Service over a user's credit bundles.
pub struct CreditLedger {
    reader: Arc<dyn EntitlementReader>,
}

impl CreditLedger {
    pub fn new(reader: Arc<dyn EntitlementReader>) -> Self {
        Self { reader }
    }

    /// True iff at least one bundle is currently spendable.
    ///
    /// Point-in-time check; may be stale by the time the caller acts.
    pub async fn has_credit(
        &self,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<bool, EntitlementError> {
        let bundles = self.reader.bundles_for(user_id, kind).await?;
        let now = Timestamp::now();
        Ok(bundles.iter().any(|b| b.is_active(now)))
    }

    /// Aggregate view over active bundles.
    ///
    /// Returns `None` when nothing is active, so callers can distinguish
    /// "never purchased" from "purchased but exhausted or expired".
    pub async fn summarize(
        &self,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<Option<CreditSummary>, EntitlementError> {
        let bundles = self.reader.bundles_for(user_id, kind).await?;
        Ok(summarize(&bundles, Timestamp::now()))
    }

    /// Three-way triage for user-facing messaging.
    ///
    /// # Errors
    ///
    /// - `NoEntitlement` - never purchased
    /// - `InsufficientCredits` - window open, balance zero
    /// - `ExpiredCredits` - every bundle past its expiry
    pub async fn assert_has_credit(
        &self,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<(), EntitlementError> {
        let bundles = self.reader.bundles_for(user_id, kind).await?;
        match classify(&bundles, Timestamp::now()) {
            CreditStanding::Spendable(_) => Ok(()),
            CreditStanding::Absent => Err(EntitlementError::NoEntitlement { kind }),
            CreditStanding::Exhausted => Err(EntitlementError::InsufficientCredits { kind }),
            CreditStanding::Expired => Err(EntitlementError::ExpiredCredits { kind }),
        }
    }

    /// Spend one credit inside the caller's ambient transaction.
    ///
    /// Selects the soonest-expiring active bundle (permanent bundles last,
    /// ties by oldest `updated_at`) and issues the guarded decrement.
    /// Returns the bundle as it stands after the decrement.
    ///
    /// # Errors
    ///
    /// The triage errors from [`CreditLedger::assert_has_credit`] when
    /// nothing is spendable (no writes are performed), or
    /// `TransientConcurrency` when a concurrent consumer drained the
    /// selected bundle between read and decrement. The latter aborts the
    /// caller's transaction; retrying the whole business operation is the
    /// caller's decision - the ledger never retries internally, since the
    /// surrounding transaction may hold other, non-idempotent writes.
    pub async fn consume(
        &self,
        tx: &mut dyn LedgerTx,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<CreditBundle, EntitlementError> {
        let now = Timestamp::now();
        let bundles = tx.bundles_for(user_id, kind).await?;

        let selected = match classify(&bundles, now) {
            CreditStanding::Spendable(bundle) => bundle,
            CreditStanding::Absent => return Err(EntitlementError::NoEntitlement { kind }),
            CreditStanding::Exhausted => {
                return Err(EntitlementError::InsufficientCredits { kind })
            }
            CreditStanding::Expired => return Err(EntitlementError::ExpiredCredits { kind }),
        };

        let affected = tx.decrement_if_available(&selected.id, now).await?;
        if affected == 0 {
            return Err(EntitlementError::TransientConcurrency);
        }

        let mut spent = selected;
        spent.remaining_credits -= 1;
        spent.updated_at = now;
        Ok(spent)
    }
}
