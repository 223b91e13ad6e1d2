//! Seedream text-to-image handler.
//!
//! Synchronous: no task polling, the provider returns image URLs (or base64
//! payloads) directly.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use studio_billing_core::{coerce, FeatureType};

use crate::error::ApiError;
use crate::handlers::debit_dispatched_feature;
use crate::novita::{SeedreamExtra, SeedreamInput, SeedreamRequest};
use crate::state::AppState;

/// Default Seedream model identifier.
const DEFAULT_MODEL: &str = "seedream-3-0-t2i-250415";

/// Default output size.
const DEFAULT_SIZE: &str = "1024x1024";

/// Default guidance scale.
const DEFAULT_GUIDANCE_SCALE: f64 = 2.5;

/// Text-to-image request.
#[derive(Debug, Deserialize)]
pub struct TextToImageRequest {
    /// Generation prompt.
    #[serde(default)]
    pub prompt: Option<String>,

    /// Model identifier override.
    #[serde(default)]
    pub model: Option<String>,

    /// `"url"` (default) or `"b64_json"`.
    #[serde(default)]
    pub response_format: Option<String>,

    /// Output size as `WxH`, 3-4 digits each.
    #[serde(default)]
    pub size: Option<String>,

    /// Random seed (`-1` for random).
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub seed: Option<i64>,

    /// Guidance scale.
    #[serde(default, deserialize_with = "coerce::opt_f64")]
    pub guidance_scale: Option<f64>,

    /// Watermark flag; accepts the canonical boolean set
    /// (`on`/`off`/`true`/`false`/`1`/`0`/`yes`/`no`). Defaults to off.
    #[serde(default, deserialize_with = "coerce::opt_bool")]
    pub watermark: Option<bool>,

    /// When present, the dispatch is debited against this identity.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub wp_user_id: Option<i64>,
}

/// Text-to-image response.
#[derive(Debug, Serialize)]
pub struct TextToImageResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// `"url"` or `"b64_json"`.
    pub format: &'static str,
    /// Image URLs or base64 payloads, per `format`.
    pub images: Vec<String>,
    /// Credits left after the dispatch debit, when one happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_remaining: Option<i64>,
    /// Credits charged by the dispatch debit, when one happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charged: Option<i64>,
}

/// Generate images from a text prompt.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TextToImageRequest>,
) -> Result<Json<TextToImageResponse>, ApiError> {
    let prompt = body
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing or empty 'prompt'"))?
        .to_string();

    let size = body.size.as_deref().unwrap_or(DEFAULT_SIZE);
    if !is_valid_size(size) {
        return Err(ApiError::bad_request("invalid 'size' (e.g., 1024x1024)"));
    }

    let want_b64 = match body.response_format.as_deref() {
        None | Some("url") => false,
        Some("b64_json") => true,
        Some(other) => {
            return Err(ApiError::bad_request(format!(
                "invalid 'response_format' ({other})"
            )))
        }
    };

    let request = SeedreamRequest {
        model: body
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        input: SeedreamInput {
            prompt,
            size: size.to_string(),
            seed: body.seed.unwrap_or(-1),
            guidance_scale: body.guidance_scale.unwrap_or(DEFAULT_GUIDANCE_SCALE),
        },
        extra: SeedreamExtra {
            watermark: body.watermark.unwrap_or(false),
        },
        response_format: if want_b64 { "b64_json" } else { "url" }.to_string(),
    };

    let novita = state.novita()?;
    let result = novita.text_to_image(&request).await?;

    let (format, images) = if want_b64 {
        let images = result.binary_data_base64.unwrap_or_default();
        if images.is_empty() {
            return Err(ApiError::Upstream {
                code: "NO_IMAGE_DATA",
                detail: "provider returned no binary_data_base64".into(),
            });
        }
        ("b64_json", images)
    } else {
        let images = result.image_urls.unwrap_or_default();
        if images.is_empty() {
            return Err(ApiError::Upstream {
                code: "NO_IMAGE_URLS",
                detail: "provider returned no image_urls".into(),
            });
        }
        ("url", images)
    };

    let metadata = json!({ "size": size, "count": images.len() });
    let debit =
        debit_dispatched_feature(&state, body.wp_user_id, FeatureType::SeedreamT2i, metadata)
            .await?;

    Ok(Json(TextToImageResponse {
        ok: true,
        format,
        images,
        credits_remaining: debit.map(|d| d.credits_remaining),
        charged: debit.map(|d| d.charged),
    }))
}

/// `WxH` with 3-4 digits on each side.
fn is_valid_size(size: &str) -> bool {
    size.split_once('x').is_some_and(|(w, h)| {
        [w, h].iter().all(|part| {
            (3..=4).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
        })
    })
}
