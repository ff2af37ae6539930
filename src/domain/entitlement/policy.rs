//! Credit classification and selection policy.
//!
//! Pure functions over a user's bundles of one kind. The transactional
//! decrement consults [`classify`] to pick the bundle to spend from;
//! read paths use [`summarize`].
//!
//! Selection order: soonest-expiring active bundle first, treating `None`
//! expiry as infinitely far, ties broken by oldest `updated_at`. Expiring
//! credit is spent before permanent credit and older grants before newer
//! ones, so spendable credit is not wasted by bundles expiring while others
//! still held balance.

use std::cmp::Ordering;

use crate::domain::foundation::Timestamp;

use super::bundle::{CreditBundle, CreditSummary};

/// Outcome of classifying a user's bundles of one kind.
///
/// The triage order matters for user-facing messages: a bundle that is past
/// its window but still holds credits reports `Expired`, not `Exhausted`.
#[derive(Debug, Clone, PartialEq)]
pub enum CreditStanding {
    /// At least one bundle is spendable; carries the selected bundle.
    Spendable(CreditBundle),
    /// Bundles exist inside their window, but all balances are zero.
    Exhausted,
    /// Bundles exist, but every one is past its expiry.
    Expired,
    /// The user never purchased this kind of credit.
    Absent,
}

/// Classifies bundles and selects the one to spend from, if any.
pub fn classify(bundles: &[CreditBundle], now: Timestamp) -> CreditStanding {
    if bundles.is_empty() {
        return CreditStanding::Absent;
    }
    if let Some(selected) = select_spendable(bundles, now) {
        return CreditStanding::Spendable(selected.clone());
    }
    if bundles.iter().any(|b| b.in_window(now)) {
        CreditStanding::Exhausted
    } else {
        CreditStanding::Expired
    }
}

/// Selects the active bundle to consume from under the ordering policy.
pub fn select_spendable(bundles: &[CreditBundle], now: Timestamp) -> Option<&CreditBundle> {
    bundles
        .iter()
        .filter(|b| b.is_active(now))
        .min_by(|a, b| spend_order(a, b))
}

fn spend_order(a: &CreditBundle, b: &CreditBundle) -> Ordering {
    match (a.expires_at, b.expires_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.updated_at.cmp(&b.updated_at))
}

/// Aggregates active bundles into a summary.
///
/// Returns `None` - not a zeroed summary - when no bundle is active, so
/// callers can distinguish "never purchased or all expired" from "purchased
/// and still holding credit".
pub fn summarize(bundles: &[CreditBundle], now: Timestamp) -> Option<CreditSummary> {
    let active: Vec<&CreditBundle> = bundles.iter().filter(|b| b.is_active(now)).collect();
    if active.is_empty() {
        return None;
    }

    let remaining: i32 = active.iter().map(|b| b.remaining_credits).sum();
    let expires_at = if active.iter().any(|b| b.expires_at.is_none()) {
        None
    } else {
        active.iter().filter_map(|b| b.expires_at).min()
    };

    Some(CreditSummary {
        total: remaining,
        remaining,
        expires_at,
    })
}
