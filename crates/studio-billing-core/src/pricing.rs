//! Pricing for billable generation features.
//!
//! Costs resolve in three steps: an explicit caller-supplied cost is trusted
//! as-is (normalized), otherwise a metadata-refined tier table is consulted,
//! otherwise the flat base table. An unknown feature with no explicit cost is
//! a hard rejection, never a zero-cost debit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::coerce;
use crate::error::CostError;
use crate::feature::FeatureType;

// ============================================================================
// Constants
// ============================================================================

/// Kling text-to-video base price in credits.
pub const KLING_T2V_CREDITS: i64 = 320;

/// Kling image-to-video (imagine) base price in credits.
pub const KLING_I2V_CREDITS: i64 = 300;

/// Seedream text-to-image base price in credits.
pub const SEEDREAM_T2I_CREDITS: i64 = 120;

/// Face-merge base price in credits.
pub const MERGE_FACE_CREDITS: i64 = 240;

/// A pricing tier for video features, keyed by duration and optionally by
/// aspect ratio.
///
/// Lookup tries the exact `(duration, aspect_ratio)` pair first, then the
/// aspect-neutral `(duration, None)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoTier {
    /// The video feature this tier prices.
    pub feature: FeatureType,

    /// Clip duration in seconds.
    pub duration_secs: i64,

    /// Aspect ratio tag (e.g. `"16:9"`), or `None` for any ratio.
    pub aspect_ratio: Option<String>,
}

/// Pricing configuration for all billable features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat base price per feature, in credits.
    pub base: HashMap<FeatureType, i64>,

    /// Duration/aspect-ratio refinements for video features.
    pub video_tiers: HashMap<VideoTier, i64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let base = HashMap::from([
            (FeatureType::KlingT2v, KLING_T2V_CREDITS),
            (FeatureType::KlingI2vImagine, KLING_I2V_CREDITS),
            (FeatureType::SeedreamT2i, SEEDREAM_T2I_CREDITS),
            (FeatureType::MergeFace, MERGE_FACE_CREDITS),
        ]);

        // 10-second clips bill at twice the 5-second base.
        let video_tiers = HashMap::from([
            (tier(FeatureType::KlingT2v, 5), KLING_T2V_CREDITS),
            (tier(FeatureType::KlingT2v, 10), KLING_T2V_CREDITS * 2),
            (tier(FeatureType::KlingI2vImagine, 5), KLING_I2V_CREDITS),
            (tier(FeatureType::KlingI2vImagine, 10), KLING_I2V_CREDITS * 2),
        ]);

        Self { base, video_tiers }
    }
}

fn tier(feature: FeatureType, duration_secs: i64) -> VideoTier {
    VideoTier {
        feature,
        duration_secs,
        aspect_ratio: None,
    }
}

impl PricingConfig {
    /// Resolve the cost of a feature usage in credits.
    ///
    /// `metadata` may refine the price for video features via `duration`
    /// (number or numeric string) and `aspect_ratio` keys. The `units`
    /// multiplier, when present, multiplies the resolved price (minimum 1).
    ///
    /// # Errors
    ///
    /// Returns [`CostError::UnknownFeatureType`] when the feature has neither
    /// a base price nor a matching tier.
    pub fn resolve(
        &self,
        feature: FeatureType,
        units: Option<i64>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<i64, CostError> {
        let price = self
            .tier_price(feature, metadata)
            .or_else(|| self.base.get(&feature).copied())
            .ok_or_else(|| CostError::UnknownFeatureType(feature.as_str().to_string()))?;

        Ok(price.saturating_mul(units.unwrap_or(1).max(1)))
    }

    /// Look up a tier price from metadata, if the metadata names a duration.
    fn tier_price(
        &self,
        feature: FeatureType,
        metadata: Option<&serde_json::Value>,
    ) -> Option<i64> {
        let metadata = metadata?;
        let duration_secs = coerce::value_as_i64(metadata.get("duration")?)?;
        let aspect_ratio = metadata
            .get("aspect_ratio")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        if let Some(ratio) = aspect_ratio {
            let exact = VideoTier {
                feature,
                duration_secs,
                aspect_ratio: Some(ratio),
            };
            if let Some(price) = self.video_tiers.get(&exact) {
                return Some(*price);
            }
        }

        self.video_tiers
            .get(&VideoTier {
                feature,
                duration_secs,
                aspect_ratio: None,
            })
            .copied()
    }
}

/// Normalize an explicit caller-supplied cost: floored to an integer and
/// clamped to zero or above. Non-finite input normalizes to zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn normalize_explicit_cost(raw: f64) -> i64 {
    if !raw.is_finite() {
        return 0;
    }
    (raw.floor() as i64).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_prices_match_the_price_table() {
        let pricing = PricingConfig::default();

        assert_eq!(
            pricing.resolve(FeatureType::KlingT2v, None, None).unwrap(),
            320
        );
        assert_eq!(
            pricing
                .resolve(FeatureType::KlingI2vImagine, None, None)
                .unwrap(),
            300
        );
        assert_eq!(
            pricing
                .resolve(FeatureType::SeedreamT2i, None, None)
                .unwrap(),
            120
        );
        assert_eq!(
            pricing.resolve(FeatureType::MergeFace, None, None).unwrap(),
            240
        );
    }

    #[test]
    fn duration_tier_refines_video_price() {
        let pricing = PricingConfig::default();

        let meta = json!({ "duration": 10 });
        assert_eq!(
            pricing
                .resolve(FeatureType::KlingT2v, None, Some(&meta))
                .unwrap(),
            640
        );

        // String durations coerce like numeric ones.
        let meta = json!({ "duration": "10", "aspect_ratio": "16:9" });
        assert_eq!(
            pricing
                .resolve(FeatureType::KlingI2vImagine, None, Some(&meta))
                .unwrap(),
            600
        );
    }

    #[test]
    fn unknown_duration_falls_back_to_base() {
        let pricing = PricingConfig::default();

        let meta = json!({ "duration": 7 });
        assert_eq!(
            pricing
                .resolve(FeatureType::KlingT2v, None, Some(&meta))
                .unwrap(),
            320
        );
    }

    #[test]
    fn units_multiply_with_minimum_one() {
        let pricing = PricingConfig::default();

        assert_eq!(
            pricing
                .resolve(FeatureType::SeedreamT2i, Some(3), None)
                .unwrap(),
            360
        );
        assert_eq!(
            pricing
                .resolve(FeatureType::SeedreamT2i, Some(0), None)
                .unwrap(),
            120
        );
        assert_eq!(
            pricing
                .resolve(FeatureType::SeedreamT2i, Some(-5), None)
                .unwrap(),
            120
        );
    }

    #[test]
    fn missing_table_entry_is_rejected() {
        let pricing = PricingConfig {
            base: HashMap::new(),
            video_tiers: HashMap::new(),
        };

        let err = pricing
            .resolve(FeatureType::MergeFace, None, None)
            .unwrap_err();
        assert!(matches!(err, CostError::UnknownFeatureType(_)));
    }

    #[test]
    fn explicit_cost_is_floored_and_clamped() {
        assert_eq!(normalize_explicit_cost(320.9), 320);
        assert_eq!(normalize_explicit_cost(0.0), 0);
        assert_eq!(normalize_explicit_cost(-15.0), 0);
        assert_eq!(normalize_explicit_cost(f64::NAN), 0);
    }
}
