//! API handlers.

pub mod credits;
pub mod health;
pub mod kling;
pub mod merge_face;
pub mod seedream;
pub mod usage;
pub mod webhooks;

use studio_billing_core::{DebitOutcome, FeatureType, WpUserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Debit a feature usage after a successful dispatch, when the caller
/// identified itself.
///
/// Generation requests may carry a `wp_user_id`; without one the request is
/// an unmetered pass-through and the frontend settles via `/consume`.
pub(crate) async fn debit_dispatched_feature(
    state: &AppState,
    wp_user_id: Option<i64>,
    feature: FeatureType,
    metadata: serde_json::Value,
) -> Result<Option<DebitOutcome>, ApiError> {
    let Some(wp_user_id) = wp_user_id else {
        return Ok(None);
    };

    let cost = state
        .config
        .pricing
        .resolve(feature, None, Some(&metadata))?;

    let outcome = state
        .ledger
        .debit(WpUserId::new(wp_user_id), feature.as_str(), cost, metadata)
        .await?;

    Ok(Some(outcome))
}
