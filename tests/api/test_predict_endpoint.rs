// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detection endpoint tests for POST /predict/ and GET /predict?url=
//!
//! These tests verify that:
//! - Uploads and URL fetches reach the detector through a staged file
//! - The four response lists stay index-aligned
//! - Every pipeline failure is a 500 with a `detail` message; malformed requests
//!   keep their 4xx status with the same body shape
//! - No staged file outlives its request

use super::support::*;
use axum::http::StatusCode;
use form_field_detector::vision::RawDetections;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

#[tokio::test]
async fn test_blank_upload_returns_four_empty_lists() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector
        .expect_predict()
        .times(1)
        .returning(|_, _| Ok(RawDetections::default()));
    let app = app_with(detector, &staging);

    let request = multipart_request("/predict/", "file", Some("form.png"), &png_bytes(100, 100));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        serde_json::json!({ "boxes": [], "confs": [], "cls": [], "names": [] })
    );
    assert_eq!(staged_files(&staging), 0);
}

#[tokio::test]
async fn test_upload_detections_are_aligned_and_named() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector
        .expect_predict()
        .withf(|path, _| path.exists())
        .returning(|_, _| {
            let mut raw = RawDetections::default();
            raw.push([10.0, 12.5, 80.0, 30.0], 0.92, 2);
            raw.push([5.0, 40.0, 20.0, 55.0], 0.61, 1);
            raw.push([0.0, 70.0, 60.0, 90.0], 0.3, 0);
            Ok(raw)
        });
    let app = app_with(detector, &staging);

    let request = multipart_request("/predict/", "file", Some("form.png"), &png_bytes(100, 100));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let boxes = body["boxes"].as_array().unwrap();
    let confs = body["confs"].as_array().unwrap();
    let cls = body["cls"].as_array().unwrap();
    let names = body["names"].as_array().unwrap();
    assert_eq!(boxes.len(), 3);
    assert_eq!(confs.len(), 3);
    assert_eq!(cls.len(), 3);
    assert_eq!(names.len(), 3);

    assert_eq!(body["cls"], serde_json::json!([2, 1, 0]));
    assert_eq!(
        body["names"],
        serde_json::json!(["text field", "checkbox", "button"])
    );
    for (i, class) in cls.iter().enumerate() {
        let index = class.as_u64().unwrap() as usize;
        assert_eq!(names[i], CLASS_NAMES[index]);
    }
    for b in boxes {
        let b: Vec<f64> = b
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert!(b[0] <= b[2] && b[1] <= b[3]);
    }
    assert_eq!(&boxes[0], &serde_json::json!([10.0, 12.5, 80.0, 30.0]));
    assert_eq!(staged_files(&staging), 0);
}

#[tokio::test]
async fn test_detector_failure_is_500_and_cleans_up() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector
        .expect_predict()
        .times(1)
        .returning(|_, _| Err(anyhow::anyhow!("onnx runtime exploded")));
    let app = app_with(detector, &staging);

    let request = multipart_request("/predict/", "file", Some("form.png"), &png_bytes(32, 32));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("onnx runtime exploded"));
    assert_eq!(staged_files(&staging), 0);
}

#[tokio::test]
async fn test_empty_upload_is_500_without_detection() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector.expect_predict().never();
    let app = app_with(detector, &staging);

    let request = multipart_request("/predict/", "file", Some("empty.png"), &[]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Uploaded image is empty");
    assert_eq!(staged_files(&staging), 0);
}

#[tokio::test]
async fn test_upload_without_file_field_is_500() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector.expect_predict().never();
    let app = app_with(detector, &staging);

    let request = multipart_request("/predict/", "comment", None, b"hello");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("No file field"));
}

#[tokio::test]
async fn test_upload_falls_back_to_first_named_file() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector
        .expect_predict()
        .times(1)
        .returning(|_, _| Ok(RawDetections::default()));
    let app = app_with(detector, &staging);

    let request = multipart_request("/predict/", "image", Some("form.png"), &png_bytes(16, 16));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_class_index_is_500() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector.expect_predict().returning(|_, _| {
        let mut raw = RawDetections::default();
        raw.push([0.0, 0.0, 1.0, 1.0], 0.9, 42);
        Ok(raw)
    });
    let app = app_with(detector, &staging);

    let request = multipart_request("/predict/", "file", Some("form.png"), &png_bytes(16, 16));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("42"));
    assert_eq!(staged_files(&staging), 0);
}

#[tokio::test]
async fn test_predict_url_fetches_and_detects() {
    let base = serve_image(png_bytes(120, 80)).await;
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector
        .expect_predict()
        .withf(|path, _| {
            // The staged file holds the fetched PNG while the detector runs
            image::open(path)
                .map(|img| img.width() == 120 && img.height() == 80)
                .unwrap_or(false)
        })
        .times(1)
        .returning(|_, _| {
            let mut raw = RawDetections::default();
            raw.push([1.0, 2.0, 3.0, 4.0], 0.5, 3);
            Ok(raw)
        });
    let app = app_with(detector, &staging);

    let uri = format!("/predict?url={}/form.png", base);
    let response = app.oneshot(get_request(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["names"], serde_json::json!(["select"]));
    assert_eq!(staged_files(&staging), 0);
}

#[tokio::test]
async fn test_predict_unreachable_url_is_500() {
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector.expect_predict().never();
    let app = app_with(detector, &staging);

    let response = app
        .oneshot(get_request("/predict?url=http://unreachable.invalid/x.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(!body["detail"].as_str().unwrap().is_empty());
    assert_eq!(staged_files(&staging), 0);
}

#[tokio::test]
async fn test_predict_url_http_error_is_500() {
    let base = serve_image(png_bytes(8, 8)).await;
    let staging = TempDir::new().unwrap();
    let mut detector = mock_detector();
    detector.expect_predict().never();
    let app = app_with(detector, &staging);

    let uri = format!("/predict?url={}/missing.png", base);
    let response = app.oneshot(get_request(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("HTTP 404"));
}

#[tokio::test]
async fn test_predict_without_url_query_is_client_error() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let response = app.oneshot(get_request("/predict")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("url"));
}

#[tokio::test]
async fn test_predict_upload_without_multipart_is_client_error() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let response = app
        .oneshot(json_request("/predict/", serde_json::json!({ "file": "nope" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    let body = body_json(response).await;
    assert!(body["detail"].is_string());
    assert_eq!(staged_files(&staging), 0);
}
