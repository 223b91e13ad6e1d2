//! Request and response types for the Novita API.

use serde::{Deserialize, Serialize};

/// Payload for the Kling async video endpoints (t2v and i2v).
#[derive(Debug, Clone, Serialize)]
pub struct KlingVideoRequest {
    /// Image input for i2v: a data-URL/base64 string or an image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Generation prompt.
    pub prompt: String,

    /// Clip duration in seconds, as a string (`"5"` or `"10"`).
    pub duration: String,

    /// Generation mode (only `"pro"` is supported).
    pub mode: String,

    /// Aspect ratio (t2v only; i2v derives it from the image).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Guidance strength in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f64>,

    /// Negative prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

/// Response to an async task submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskResponse {
    /// The provider task id, absent when the submission was rejected.
    pub task_id: Option<String>,
}

/// Envelope returned by the task-result endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResultResponse {
    /// Task state.
    #[serde(default)]
    pub task: TaskInfo,

    /// Produced videos, present once the task succeeded.
    #[serde(default)]
    pub videos: Vec<TaskVideo>,
}

/// Task state within a task-result envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInfo {
    /// Provider status tag (`TASK_STATUS_SUCCEED`, `TASK_STATUS_FAILED`, ...).
    #[serde(default)]
    pub status: String,

    /// Completion percentage.
    #[serde(default)]
    pub progress_percent: Option<i64>,

    /// Estimated seconds until completion.
    #[serde(default)]
    pub eta: Option<i64>,

    /// Failure reason, when failed.
    #[serde(default)]
    pub reason: Option<String>,
}

/// One produced video.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskVideo {
    /// Download URL.
    pub video_url: Option<String>,
}

/// Payload for the synchronous Seedream text-to-image endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SeedreamRequest {
    /// Model identifier.
    pub model: String,

    /// Generation input.
    pub input: SeedreamInput,

    /// Extra options (watermark lives here, not in `input`).
    pub extra: SeedreamExtra,

    /// `"url"` or `"b64_json"`.
    pub response_format: String,
}

/// Seedream generation input.
#[derive(Debug, Clone, Serialize)]
pub struct SeedreamInput {
    /// Generation prompt.
    pub prompt: String,

    /// Output size as `WxH` (e.g. `"1024x1024"`).
    pub size: String,

    /// Random seed (`-1` for random).
    pub seed: i64,

    /// Guidance scale.
    pub guidance_scale: f64,
}

/// Seedream extra options.
#[derive(Debug, Clone, Serialize)]
pub struct SeedreamExtra {
    /// Whether to watermark the output.
    pub watermark: bool,
}

/// Seedream response.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedreamResponse {
    /// Image URLs (when `response_format` is `"url"`).
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,

    /// Base64 images (when `response_format` is `"b64_json"`).
    #[serde(default)]
    pub binary_data_base64: Option<Vec<String>>,
}

/// Payload for the synchronous face-merge endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MergeFaceRequest {
    /// Base64 of the face to transplant.
    pub face_image_file: String,

    /// Base64 of the target image.
    pub image_file: String,
}

/// Face-merge response.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeFaceResponse {
    /// Base64 of the merged image, absent on provider failure.
    pub image_file: Option<String>,

    /// Image format tag (`"png"`, `"jpeg"`, ...).
    pub image_type: Option<String>,
}
