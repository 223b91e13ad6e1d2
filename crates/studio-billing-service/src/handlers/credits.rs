//! Credit consumption handler (the debit operation).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use studio_billing_core::{coerce, normalize_explicit_cost, FeatureType, WpUserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Feature tag recorded when a caller charges an explicit cost without
/// naming a feature.
const GENERIC_FEATURE_TAG: &str = "generic";

/// Debit request.
///
/// Either `credits_spent` (an explicit cost, trusted after normalization) or
/// `feature_type` (resolved against the price table, refined by `metadata`
/// and multiplied by `units`) must be present.
#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    /// The identity to charge.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub wp_user_id: Option<i64>,

    /// Feature tag to price and record.
    #[serde(default)]
    pub feature_type: Option<String>,

    /// Explicit cost override in credits.
    #[serde(default, deserialize_with = "coerce::opt_f64")]
    pub credits_spent: Option<f64>,

    /// Structured metadata to attach to the usage record.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,

    /// Unit multiplier for table-priced features.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub units: Option<i64>,
}

/// Debit response.
#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Credits left after the debit.
    pub credits_remaining: i64,
    /// Credits charged.
    pub charged: i64,
}

/// Atomically debit a user's balance and record the usage.
pub async fn consume(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConsumeRequest>,
) -> Result<Json<ConsumeResponse>, ApiError> {
    let wp_user_id = body
        .wp_user_id
        .map(WpUserId::new)
        .ok_or_else(|| ApiError::missing_fields("wp_user_id"))?;

    // Explicit cost wins; otherwise the feature tag must price out of the
    // table. An unknown tag with no override is a hard rejection, never a
    // zero-cost debit.
    let cost = match body.credits_spent {
        Some(raw) => normalize_explicit_cost(raw),
        None => {
            let tag = body
                .feature_type
                .as_deref()
                .ok_or_else(|| ApiError::missing_fields("feature_type or credits_spent"))?;
            let feature: FeatureType = tag.parse()?;
            state
                .config
                .pricing
                .resolve(feature, body.units, body.metadata.as_ref())?
        }
    };

    let feature_tag = body
        .feature_type
        .as_deref()
        .unwrap_or(GENERIC_FEATURE_TAG)
        .to_string();
    let metadata = body
        .metadata
        .unwrap_or_else(|| json!({ "units": body.units.unwrap_or(1) }));

    let outcome = state
        .ledger
        .debit(wp_user_id, &feature_tag, cost, metadata)
        .await?;

    Ok(Json(ConsumeResponse {
        ok: true,
        credits_remaining: outcome.credits_remaining,
        charged: outcome.charged,
    }))
}
