//! Entitlement error taxonomy.
//!
//! All of these are expected, user-facing conditions rather than bugs; the
//! UI layer maps them to distinct messages and calls to action. None of
//! them is retried inside the ledger itself.

use thiserror::Error;

use crate::domain::foundation::DomainError;

use super::bundle::CreditKind;

/// Errors surfaced by credit checks and consumption.
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// The user never purchased credits of this kind.
    #[error("No {kind} entitlement purchased")]
    NoEntitlement { kind: CreditKind },

    /// Credits were purchased and the window is open, but the balance is
    /// zero.
    #[error("No {kind} credits remaining")]
    InsufficientCredits { kind: CreditKind },

    /// Credits exist but every bundle is past its expiry.
    #[error("{kind} credits have expired")]
    ExpiredCredits { kind: CreditKind },

    /// A concurrent consumer drained the selected bundle between read and
    /// decrement. The caller's business transaction must abort; whether to
    /// retry the whole operation is the caller's decision.
    #[error("Concurrent consumption conflict; retry the operation")]
    TransientConcurrency,

    /// Transactional store operation failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl From<DomainError> for EntitlementError {
    fn from(err: DomainError) -> Self {
        EntitlementError::Store(err.to_string())
    }
}
