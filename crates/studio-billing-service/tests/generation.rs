//! Generation gateway integration tests against a mocked provider.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Kling text-to-video
// ============================================================================

#[tokio::test]
async fn t2v_generate_returns_task_id() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/async/kling-2.5-turbo-t2v"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "task-123" })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let response = harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a red fox in the snow", "duration": "5" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["generation_id"], "task-123");
    assert_eq!(body["status"], "queued");
}

#[tokio::test]
async fn t2v_generate_debits_identified_caller() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/async/kling-2.5-turbo-t2v"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "task-123" })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());
    harness.ingest(42, 1000, true).await;

    let response = harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a red fox", "duration": 5, "wp_user_id": 42 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["charged"], 320);
    assert_eq!(body["credits_remaining"], 680);

    let report: serde_json::Value = harness.server.get("/usage/42").await.json();
    assert_eq!(report["recent_usage"][0]["feature_type"], "kling_v25_t2v");
}

#[tokio::test]
async fn t2v_ten_second_clip_bills_double() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/async/kling-2.5-turbo-t2v"))
        .and(body_partial_json(json!({ "duration": "10" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "task-123" })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());
    harness.ingest(42, 1000, true).await;

    let response = harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a red fox", "duration": 10, "wp_user_id": 42 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["charged"], 640);
    assert_eq!(body["credits_remaining"], 360);
}

#[tokio::test]
async fn t2v_insufficient_credits_surface_after_dispatch() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/async/kling-2.5-turbo-t2v"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "task-123" })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());
    harness.ingest(42, 100, true).await;

    let response = harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a red fox", "wp_user_id": 42 }))
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["details"]["credits_remaining"], 100);
}

#[tokio::test]
async fn t2v_validation_rejections() {
    let harness = TestHarness::with_novita("http://localhost:1");

    // Missing prompt never reaches the provider.
    harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "duration": 5 }))
        .await
        .assert_status_bad_request();

    harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a fox", "duration": 7 }))
        .await
        .assert_status_bad_request();

    harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a fox", "cfg_scale": 1.5 }))
        .await
        .assert_status_bad_request();

    harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a fox", "aspect_ratio": "4:3" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn t2v_provider_without_task_id_is_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/async/kling-2.5-turbo-t2v"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let response = harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a fox" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "NO_TASK_ID");
}

#[tokio::test]
async fn generation_without_provider_key_is_server_error() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/kling/v2-5/t2v/generate")
        .json(&json!({ "prompt": "a fox" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "SERVER_ERROR");
}

// ============================================================================
// Kling image-to-video
// ============================================================================

#[tokio::test]
async fn i2v_requires_an_image() {
    let harness = TestHarness::with_novita("http://localhost:1");

    let response = harness
        .server
        .post("/api/kling/v2-5/i2v/generate")
        .json(&json!({ "prompt": "animate this" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "MISSING_FIELDS");
}

#[tokio::test]
async fn i2v_accepts_image_url_input() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/async/kling-2.5-turbo-i2v"))
        .and(body_partial_json(json!({ "image": "https://cdn.example.com/fox.png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "task-456" })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let response = harness
        .server
        .post("/api/kling/v2-5/i2v/generate")
        .json(&json!({
            "prompt": "animate this",
            "image_url": "https://cdn.example.com/fox.png",
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["generation_id"], "task-456");
}

#[tokio::test]
async fn i2v_oversized_base64_image_is_rejected() {
    let harness = TestHarness::with_novita("http://localhost:1");

    // ~12MB decoded, over the 10MB provider limit.
    let oversized = "A".repeat(16 * 1024 * 1024);

    let response = harness
        .server
        .post("/api/kling/v2-5/i2v/generate")
        .json(&json!({ "prompt": "animate this", "image_base64": oversized }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "IMAGE_TOO_LARGE");
}

// ============================================================================
// Task status
// ============================================================================

#[tokio::test]
async fn task_status_maps_provider_states() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/async/task-result"))
        .and(query_param("task_id", "done-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task": { "status": "TASK_STATUS_SUCCEED", "progress_percent": 100, "eta": 0 },
            "videos": [{ "video_url": "https://cdn.example.com/out.mp4" }],
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/async/task-result"))
        .and(query_param("task_id", "failed-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task": { "status": "TASK_STATUS_FAILED", "reason": "nsfw content" },
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/async/task-result"))
        .and(query_param("task_id", "running-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task": { "status": "TASK_STATUS_PROCESSING", "progress_percent": 40, "eta": 12 },
        })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let body: serde_json::Value = harness
        .server
        .get("/api/kling/v2-5/t2v/status/done-task")
        .await
        .json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["video_url"], "https://cdn.example.com/out.mp4");

    let body: serde_json::Value = harness
        .server
        .get("/api/kling/v2-5/i2v/status/failed-task")
        .await
        .json();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["reason"], "nsfw content");

    let body: serde_json::Value = harness
        .server
        .get("/api/kling/v2-5/t2v/status/running-task")
        .await
        .json();
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["meta"]["progress"], 40);
    assert_eq!(body["meta"]["eta"], 12);
}

#[tokio::test]
async fn task_status_provider_failure_is_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/async/task-result"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let response = harness
        .server
        .get("/api/kling/v2-5/t2v/status/any-task")
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

// ============================================================================
// Seedream text-to-image
// ============================================================================

#[tokio::test]
async fn t2i_returns_image_urls_and_debits() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/seedream-3-0-txt2img"))
        // The canonical boolean parser turns "on" into a real watermark flag.
        .and(body_partial_json(json!({ "extra": { "watermark": true } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_urls": ["https://cdn.example.com/a.png", "https://cdn.example.com/b.png"],
        })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());
    harness.ingest(42, 1000, true).await;

    let response = harness
        .server
        .post("/api/seedream/3/t2i/generate")
        .json(&json!({ "prompt": "a fox", "watermark": "on", "wp_user_id": 42 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["format"], "url");
    assert_eq!(body["images"].as_array().unwrap().len(), 2);
    assert_eq!(body["charged"], 120);
    assert_eq!(body["credits_remaining"], 880);
}

#[tokio::test]
async fn t2i_empty_provider_payload_is_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/seedream-3-0-txt2img"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let response = harness
        .server
        .post("/api/seedream/3/t2i/generate")
        .json(&json!({ "prompt": "a fox" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "NO_IMAGE_URLS");
}

#[tokio::test]
async fn t2i_invalid_size_is_rejected() {
    let harness = TestHarness::with_novita("http://localhost:1");

    harness
        .server
        .post("/api/seedream/3/t2i/generate")
        .json(&json!({ "prompt": "a fox", "size": "huge" }))
        .await
        .assert_status_bad_request();
}

// ============================================================================
// Face merge
// ============================================================================

#[tokio::test]
async fn merge_face_returns_data_url() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/merge-face"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_file": "bWVyZ2Vk",
            "image_type": "png",
        })))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let response = harness
        .server
        .post("/api/novita/merge-face/generate")
        .json(&json!({ "face_image_file": "ZmFjZQ==", "image_file": "dGFyZ2V0" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["image_type"], "png");
    assert_eq!(body["image_base64"], "bWVyZ2Vk");
    assert_eq!(body["data_url"], "data:image/png;base64,bWVyZ2Vk");
}

#[tokio::test]
async fn merge_face_requires_both_images() {
    let harness = TestHarness::with_novita("http://localhost:1");

    let response = harness
        .server
        .post("/api/novita/merge-face/generate")
        .json(&json!({ "face_image_file": "ZmFjZQ==" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "MISSING_IMAGES");
}

#[tokio::test]
async fn merge_face_missing_provider_payload_is_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/merge-face"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock)
        .await;

    let harness = TestHarness::with_novita(&mock.uri());

    let response = harness
        .server
        .post("/api/novita/merge-face/generate")
        .json(&json!({ "face_image_file": "ZmFjZQ==", "image_file": "dGFyZ2V0" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "NO_IMAGE_DATA");
}
