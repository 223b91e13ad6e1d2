//! Face-merge handler.
//!
//! Takes two base64 images (a face and a target) and returns the merged
//! image as base64 plus a ready-to-embed data URL.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use studio_billing_core::{coerce, FeatureType};

use crate::error::ApiError;
use crate::handlers::debit_dispatched_feature;
use crate::novita;
use crate::state::AppState;

/// Face-merge request.
#[derive(Debug, Deserialize)]
pub struct MergeFaceRequest {
    /// Base64 of the face to transplant.
    #[serde(default)]
    pub face_image_file: Option<String>,

    /// Base64 of the target image.
    #[serde(default)]
    pub image_file: Option<String>,

    /// When present, the dispatch is debited against this identity.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub wp_user_id: Option<i64>,
}

/// Face-merge response.
#[derive(Debug, Serialize)]
pub struct MergeFaceResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Image format tag (`"png"`, `"jpeg"`, ...).
    pub image_type: String,
    /// Merged image as base64.
    pub image_base64: String,
    /// Ready-to-embed data URL.
    pub data_url: String,
    /// Credits left after the dispatch debit, when one happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_remaining: Option<i64>,
    /// Credits charged by the dispatch debit, when one happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charged: Option<i64>,
}

/// Merge a face into a target image.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MergeFaceRequest>,
) -> Result<Json<MergeFaceResponse>, ApiError> {
    let (Some(face), Some(target)) = (
        body.face_image_file.filter(|s| !s.is_empty()),
        body.image_file.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::Validation {
            code: "MISSING_IMAGES",
            message: "send face_image_file + image_file as base64".into(),
        });
    };

    let request = novita::MergeFaceRequest {
        face_image_file: face,
        image_file: target,
    };

    let client = state.novita()?;
    let result = client.merge_face(&request).await?;

    let image_base64 = result.image_file.ok_or_else(|| ApiError::Upstream {
        code: "NO_IMAGE_DATA",
        detail: "provider returned no image_file".into(),
    })?;
    let image_type = result.image_type.unwrap_or_else(|| "png".to_string());

    let debit = debit_dispatched_feature(
        &state,
        body.wp_user_id,
        FeatureType::MergeFace,
        json!({ "image_type": image_type }),
    )
    .await?;

    let data_url = format!("data:image/{image_type};base64,{image_base64}");

    Ok(Json(MergeFaceResponse {
        ok: true,
        image_type,
        image_base64,
        data_url,
        credits_remaining: debit.map(|d| d.credits_remaining),
        charged: debit.map(|d| d.charged),
    }))
}
