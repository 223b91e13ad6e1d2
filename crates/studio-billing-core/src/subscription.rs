//! Subscription and balance types for studio-billing.
//!
//! A user has at most one authoritative subscription/balance pair. Both are
//! (re)established by subscription ingestion and only the debit transaction
//! ever decrements a balance.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::WpUserId;

/// A user's subscription for the current billing cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Plan identifier from the billing system.
    pub plan_id: i64,

    /// Credits granted per billing cycle.
    pub monthly_credit_limit: i64,

    /// First day of the current cycle.
    pub cycle_start: NaiveDate,

    /// Last day of the current cycle.
    pub cycle_end: NaiveDate,

    /// Whether spending is currently permitted.
    pub active: bool,
}

/// A user's prepaid credit balance.
///
/// `credits_remaining` is never negative; the debit transaction rejects any
/// decrement that would cross zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Credits left in the current cycle.
    pub credits_remaining: i64,

    /// Cycle the balance was last reset for.
    pub cycle_start: Option<NaiveDate>,

    /// When the balance last changed.
    pub updated_at: DateTime<Utc>,
}

/// A validated subscription-update notification from the billing system.
///
/// All fields are required on the wire except `email` and `active`
/// (`active` defaults to `false` when absent). `plan_id` and
/// `monthly_credit_limit` of `0` are legitimate values; required-ness is
/// field presence, not truthiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    /// The external user identity the update applies to.
    pub wp_user_id: WpUserId,

    /// Email to attach to the user, when the billing system knows it.
    pub email: Option<String>,

    /// Plan identifier.
    pub plan_id: i64,

    /// Credits granted for the new cycle.
    pub monthly_credit_limit: i64,

    /// First day of the new cycle.
    pub cycle_start: NaiveDate,

    /// Last day of the new cycle.
    pub cycle_end: NaiveDate,

    /// Whether the subscription is active.
    pub active: bool,
}
