//! Usage records and reporting types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::WpUserId;

/// An immutable record of one billed action.
///
/// Written in the same atomic unit as the balance decrement it accounts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Feature tag of the billed action (`"generic"` when the caller charged
    /// an explicit cost without naming a feature).
    pub feature_type: String,

    /// Credits deducted for this action.
    pub credits_spent: i64,

    /// Caller-supplied structured metadata.
    pub metadata: serde_json::Value,

    /// When the debit committed.
    pub created_at: DateTime<Utc>,
}

/// The result of a successful debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitOutcome {
    /// Credits left after the debit.
    pub credits_remaining: i64,

    /// Credits charged by the debit.
    pub charged: i64,
}

/// Read-only projection of a user's entitlement and recent usage.
///
/// A user with no subscription reports zeroed/null fields rather than an
/// error; callers must tolerate that state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    /// The external identity the report is for.
    pub wp_user_id: WpUserId,

    /// Plan identifier, when a subscription exists.
    pub plan_id: Option<i64>,

    /// Monthly credit limit (0 without a subscription).
    pub monthly_credit_limit: i64,

    /// Whether the subscription is active (false without one).
    pub active: bool,

    /// Credits left (0 without a balance row).
    pub credits_remaining: i64,

    /// Current cycle start, from the balance row.
    pub cycle_start: Option<NaiveDate>,

    /// Current cycle end, from the subscription row.
    pub cycle_end: Option<NaiveDate>,

    /// Most recent usage entries, newest first.
    pub recent_usage: Vec<UsageLogEntry>,
}
