//! Usage reporting handler.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use studio_billing_core::{UsageReport, WpUserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Report a user's entitlement and recent usage.
///
/// A user with no subscription reports zeroed/null fields; only a missing
/// user row is an error.
pub async fn usage_report(
    State(state): State<Arc<AppState>>,
    Path(wp_user_id): Path<i64>,
) -> Result<Json<UsageReport>, ApiError> {
    let report = state
        .ledger
        .usage_report(WpUserId::new(wp_user_id), state.config.recent_usage_limit)
        .await?;

    Ok(Json(report))
}
