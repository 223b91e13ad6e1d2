//! Kling video generation handlers (text-to-video and image-to-video).
//!
//! Both routes validate locally, forward to the provider's async task API,
//! and return the task id for the frontend to poll via the status route.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use studio_billing_core::{coerce, FeatureType};

use crate::error::ApiError;
use crate::handlers::debit_dispatched_feature;
use crate::novita::KlingVideoRequest;
use crate::state::AppState;

// ============================================================================
// Constants
// ============================================================================

/// Provider limit for base64 image payloads.
const MAX_IMAGE_BASE64_BYTES: usize = 10 * 1024 * 1024;

/// Supported clip durations in seconds.
const VALID_DURATIONS: [i64; 2] = [5, 10];

/// Supported aspect ratios for text-to-video.
const VALID_ASPECT_RATIOS: [&str; 3] = ["16:9", "9:16", "1:1"];

/// The only supported generation mode.
const MODE_PRO: &str = "pro";

/// Video generation request (shared by t2v and i2v).
#[derive(Debug, Deserialize)]
pub struct VideoGenerateRequest {
    /// Generation prompt.
    #[serde(default)]
    pub prompt: Option<String>,

    /// Clip duration in seconds (`5` or `10`, number or string).
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub duration: Option<i64>,

    /// Aspect ratio (t2v only).
    #[serde(default)]
    pub aspect_ratio: Option<String>,

    /// Guidance strength in `[0, 1]`.
    #[serde(default, deserialize_with = "coerce::opt_f64")]
    pub cfg_scale: Option<f64>,

    /// Generation mode (only `"pro"`).
    #[serde(default)]
    pub mode: Option<String>,

    /// Negative prompt.
    #[serde(default)]
    pub negative_prompt: Option<String>,

    /// Image input for i2v: data-URL or bare base64.
    #[serde(default)]
    pub image_base64: Option<String>,

    /// Image input for i2v: an image URL.
    #[serde(default)]
    pub image_url: Option<String>,

    /// When present, the dispatch is debited against this identity.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub wp_user_id: Option<i64>,
}

/// Video generation response.
#[derive(Debug, Serialize)]
pub struct VideoGenerateResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Provider task id to poll.
    pub generation_id: String,
    /// Always `"queued"` on submission.
    pub status: &'static str,
    /// Credits left after the dispatch debit, when one happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_remaining: Option<i64>,
    /// Credits charged by the dispatch debit, when one happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charged: Option<i64>,
}

/// Task status response.
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    /// `"in_progress"`, `"failed"`, or `"success"`.
    pub status: &'static str,
    /// Download URL, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Failure reason, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Progress metadata.
    pub meta: TaskMeta,
}

/// Task progress metadata.
#[derive(Debug, Serialize)]
pub struct TaskMeta {
    /// Completion percentage.
    pub progress: i64,
    /// Estimated seconds until completion.
    pub eta: i64,
    /// The polled task id.
    pub task_id: String,
}

/// Submit a text-to-video task.
pub async fn generate_t2v(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VideoGenerateRequest>,
) -> Result<Json<VideoGenerateResponse>, ApiError> {
    let (prompt, duration, cfg_scale) = validate_video_request(&body)?;

    let aspect_ratio = match body.aspect_ratio.as_deref() {
        None => None,
        Some(ratio) if VALID_ASPECT_RATIOS.contains(&ratio) => Some(ratio.to_string()),
        Some(ratio) => {
            return Err(ApiError::bad_request(format!(
                "invalid 'aspect_ratio' ({ratio})"
            )))
        }
    };

    let request = KlingVideoRequest {
        image: None,
        prompt,
        duration: duration.to_string(),
        mode: MODE_PRO.to_string(),
        aspect_ratio: aspect_ratio.clone(),
        cfg_scale,
        negative_prompt: body.negative_prompt.clone(),
    };

    let novita = state.novita()?;
    let task = novita.submit_t2v(&request).await?;
    let generation_id = task.task_id.ok_or_else(|| ApiError::Upstream {
        code: "NO_TASK_ID",
        detail: "provider returned no task_id".into(),
    })?;

    let mut metadata = json!({ "duration": duration, "task_id": generation_id });
    if let Some(ratio) = &aspect_ratio {
        metadata["aspect_ratio"] = json!(ratio);
    }
    let debit =
        debit_dispatched_feature(&state, body.wp_user_id, FeatureType::KlingT2v, metadata).await?;

    Ok(Json(VideoGenerateResponse {
        ok: true,
        generation_id,
        status: "queued",
        credits_remaining: debit.map(|d| d.credits_remaining),
        charged: debit.map(|d| d.charged),
    }))
}

/// Submit an image-to-video task.
pub async fn generate_i2v(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VideoGenerateRequest>,
) -> Result<Json<VideoGenerateResponse>, ApiError> {
    let (prompt, duration, cfg_scale) = validate_video_request(&body)?;

    // Image input precedence: base64 over URL.
    let image = if let Some(b64) = &body.image_base64 {
        if estimated_base64_bytes(b64) > MAX_IMAGE_BASE64_BYTES {
            return Err(ApiError::Validation {
                code: "IMAGE_TOO_LARGE",
                message: "image exceeds the 10MB provider limit".into(),
            });
        }
        b64.clone()
    } else if let Some(url) = &body.image_url {
        url.clone()
    } else {
        return Err(ApiError::missing_fields("image_base64 or image_url"));
    };

    let request = KlingVideoRequest {
        image: Some(image),
        prompt,
        duration: duration.to_string(),
        mode: MODE_PRO.to_string(),
        // The provider derives the i2v aspect ratio from the image.
        aspect_ratio: None,
        cfg_scale,
        negative_prompt: body.negative_prompt.clone(),
    };

    let novita = state.novita()?;
    let task = novita.submit_i2v(&request).await?;
    let generation_id = task.task_id.ok_or_else(|| ApiError::Upstream {
        code: "NO_TASK_ID",
        detail: "provider returned no task_id".into(),
    })?;

    let metadata = json!({ "duration": duration, "task_id": generation_id });
    let debit = debit_dispatched_feature(
        &state,
        body.wp_user_id,
        FeatureType::KlingI2vImagine,
        metadata,
    )
    .await?;

    Ok(Json(VideoGenerateResponse {
        ok: true,
        generation_id,
        status: "queued",
        credits_remaining: debit.map(|d| d.credits_remaining),
        charged: debit.map(|d| d.charged),
    }))
}

/// Poll a video task by id (shared by t2v and i2v).
pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let novita = state.novita()?;
    let result = novita.task_result(&task_id).await?;

    let meta = TaskMeta {
        progress: result.task.progress_percent.unwrap_or(0),
        eta: result.task.eta.unwrap_or(0),
        task_id,
    };

    let response = match result.task.status.as_str() {
        "TASK_STATUS_SUCCEED" => {
            let video_url = result.videos.first().and_then(|v| v.video_url.clone());
            TaskStatusResponse {
                status: "success",
                video_url,
                reason: None,
                meta,
            }
        }
        "TASK_STATUS_FAILED" => TaskStatusResponse {
            status: "failed",
            video_url: None,
            reason: Some(
                result
                    .task
                    .reason
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "Model failed".to_string()),
            ),
            meta,
        },
        _ => TaskStatusResponse {
            status: "in_progress",
            video_url: None,
            reason: None,
            meta,
        },
    };

    Ok(Json(response))
}

/// Validate the fields shared by t2v and i2v.
fn validate_video_request(
    body: &VideoGenerateRequest,
) -> Result<(String, i64, Option<f64>), ApiError> {
    let prompt = body
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing or empty 'prompt'"))?
        .to_string();

    let duration = body.duration.unwrap_or(5);
    if !VALID_DURATIONS.contains(&duration) {
        return Err(ApiError::bad_request("invalid 'duration' (5|10)"));
    }

    if let Some(cfg) = body.cfg_scale {
        if !(0.0..=1.0).contains(&cfg) {
            return Err(ApiError::bad_request("invalid 'cfg_scale' (0..1)"));
        }
    }

    if let Some(mode) = body.mode.as_deref() {
        if mode != MODE_PRO {
            return Err(ApiError::bad_request("invalid 'mode' (only 'pro' supported)"));
        }
    }

    Ok((prompt, duration, body.cfg_scale))
}

/// Rough byte size of a base64 payload, data-URL prefix excluded.
fn estimated_base64_bytes(data: &str) -> usize {
    let payload = data
        .split_once("base64,")
        .map_or(data, |(_, payload)| payload);
    payload.len() * 3 / 4
}
