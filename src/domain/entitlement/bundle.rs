//! Credit bundle value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{EntitlementId, Timestamp, UserId, ValidationError};

/// What a credit can be spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditKind {
    /// Publish one job posting.
    JobPost,
    /// Enroll in one course.
    CourseEnroll,
    /// Feature an artist profile for one period.
    ProfileBoost,
}

impl CreditKind {
    /// Canonical snake_case name used in storage and APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditKind::JobPost => "job_post",
            CreditKind::CourseEnroll => "course_enroll",
            CreditKind::ProfileBoost => "profile_boost",
        }
    }
}

impl fmt::Display for CreditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CreditKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_post" => Ok(CreditKind::JobPost),
            "course_enroll" => Ok(CreditKind::CourseEnroll),
            "profile_boost" => Ok(CreditKind::ProfileBoost),
            other => Err(ValidationError::invalid_format(
                "credit_kind",
                format!("unknown kind '{}'", other),
            )),
        }
    }
}

/// One grant of N credits of a given kind, optionally expiring.
///
/// A user may hold several bundles of the same kind from separate
/// purchases, each with its own expiry. `remaining_credits` only decreases
/// through consumption and only increases through a grant.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditBundle {
    pub id: EntitlementId,
    pub user_id: UserId,
    pub kind: CreditKind,
    pub remaining_credits: i32,
    /// `None` means the bundle never expires.
    pub expires_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl CreditBundle {
    /// True while the bundle's time window is open (regardless of balance).
    pub fn in_window(&self, now: Timestamp) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry.is_after(&now),
        }
    }

    /// True iff the bundle can currently be spent from.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.in_window(now) && self.remaining_credits > 0
    }
}

/// Aggregate view over a user's active bundles of one kind.
///
/// There is no separate "used" tracking; `total` equals `remaining`.
/// `expires_at` is `None` if any active bundle never expires, otherwise the
/// soonest expiry among active bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditSummary {
    pub total: i32,
    pub remaining: i32,
    pub expires_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(remaining: i32, expires_at: Option<Timestamp>) -> CreditBundle {
        CreditBundle {
            id: EntitlementId::new(),
            user_id: UserId::new("user-1").unwrap(),
            kind: CreditKind::JobPost,
            remaining_credits: remaining,
            expires_at,
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn never_expiring_bundle_is_always_in_window() {
        let b = bundle(1, None);
        assert!(b.in_window(Timestamp::now()));
    }

    #[test]
    fn future_expiry_is_in_window_past_expiry_is_not() {
        let now = Timestamp::now();
        assert!(bundle(1, Some(now.add_days(1))).in_window(now));
        assert!(!bundle(1, Some(now.minus_days(1))).in_window(now));
    }

    #[test]
    fn active_requires_balance_and_window() {
        let now = Timestamp::now();
        assert!(bundle(1, None).is_active(now));
        assert!(!bundle(0, None).is_active(now));
        assert!(!bundle(5, Some(now.minus_days(1))).is_active(now));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [CreditKind::JobPost, CreditKind::CourseEnroll, CreditKind::ProfileBoost] {
            assert_eq!(kind.as_str().parse::<CreditKind>().unwrap(), kind);
        }
        assert!("gold_stars".parse::<CreditKind>().is_err());
    }
}
