//! Subscription ingestion webhook.
//!
//! The billing system posts here on every (re)subscription or renewal. The
//! payload is loosely typed on the wire; a single normalization pass turns it
//! into a [`SubscriptionUpdate`] before the ledger sees it.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use studio_billing_core::{coerce, SubscriptionUpdate, WpUserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Subscription-update payload from the billing system.
///
/// `plan_id` and `monthly_credit_limit` of `0` are legitimate values;
/// required-ness is field presence, never truthiness.
#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdateRequest {
    /// The identity the update applies to.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub wp_user_id: Option<i64>,

    /// Email to attach to the user.
    #[serde(default)]
    pub email: Option<String>,

    /// Plan identifier.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub plan_id: Option<i64>,

    /// Credits granted for the new cycle.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub monthly_credit_limit: Option<i64>,

    /// First day of the new cycle (`YYYY-MM-DD`).
    #[serde(default)]
    pub cycle_start: Option<String>,

    /// Last day of the new cycle (`YYYY-MM-DD`).
    #[serde(default)]
    pub cycle_end: Option<String>,

    /// Whether the subscription is active; defaults to `false` when absent.
    #[serde(default, deserialize_with = "coerce::opt_bool")]
    pub active: Option<bool>,
}

/// Subscription-update response.
#[derive(Debug, Serialize)]
pub struct SubscriptionUpdateResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// The internal user id the update landed on.
    pub user_id: i64,
}

/// Make a subscription-update notification authoritative.
pub async fn subscription_update(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubscriptionUpdateRequest>,
) -> Result<Json<SubscriptionUpdateResponse>, ApiError> {
    let mut missing = Vec::new();
    if body.wp_user_id.is_none() {
        missing.push("wp_user_id");
    }
    if body.plan_id.is_none() {
        missing.push("plan_id");
    }
    if body.monthly_credit_limit.is_none() {
        missing.push("monthly_credit_limit");
    }
    if body.cycle_start.is_none() {
        missing.push("cycle_start");
    }
    if body.cycle_end.is_none() {
        missing.push("cycle_end");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing.join(", ")));
    }

    let update = SubscriptionUpdate {
        wp_user_id: WpUserId::new(body.wp_user_id.unwrap_or_default()),
        email: body.email,
        plan_id: body.plan_id.unwrap_or_default(),
        monthly_credit_limit: body.monthly_credit_limit.unwrap_or_default(),
        cycle_start: parse_date(body.cycle_start.as_deref().unwrap_or_default())?,
        cycle_end: parse_date(body.cycle_end.as_deref().unwrap_or_default())?,
        active: body.active.unwrap_or(false),
    };

    let user_id = state.ledger.upsert_subscription(&update).await?;

    Ok(Json(SubscriptionUpdateResponse {
        ok: true,
        user_id: user_id.get(),
    }))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("invalid date: {raw}")))
}
