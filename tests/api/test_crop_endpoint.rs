// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Crop endpoint tests for POST /crop/
//!
//! These tests verify that:
//! - Each tag yields one base64 PNG of the requested size, in tag order
//! - Out-of-image regions become empty strings instead of errors
//! - Malformed tags and unreachable sources fail with 500 `{detail}`

use super::support::*;
use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

fn decode_png(encoded: &serde_json::Value) -> image::DynamicImage {
    let bytes = STANDARD.decode(encoded.as_str().unwrap()).unwrap();
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap()
}

fn crop_app(staging: &TempDir) -> axum::Router {
    let mut detector = mock_detector();
    detector.expect_predict().never();
    app_with(detector, staging)
}

#[tokio::test]
async fn test_crop_single_tag_returns_exact_size() {
    let base = serve_image(png_bytes(200, 200)).await;
    let staging = TempDir::new().unwrap();
    let app = crop_app(&staging);

    let body = json!({
        "url": format!("{}/form.png", base),
        "tags": [{"height": 50, "name": "email", "type": "input", "width": 50, "x": 10, "y": 10}]
    });
    let response = app.oneshot(json_request("/crop/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let base64s = body["base64s"].as_array().unwrap();
    assert_eq!(base64s.len(), 1);

    let crop = decode_png(&base64s[0]);
    assert_eq!((crop.width(), crop.height()), (50, 50));
    // Fixture pixel (x, y) is [x, y, 128]
    assert_eq!(crop.to_rgb8().get_pixel(0, 0).0, [10, 10, 128]);
}

#[tokio::test]
async fn test_crop_preserves_tag_order_and_empty_slots() {
    let base = serve_image(png_bytes(100, 100)).await;
    let staging = TempDir::new().unwrap();
    let app = crop_app(&staging);

    let body = json!({
        "url": format!("{}/form.png", base),
        "tags": [
            {"height": 20, "name": "a", "type": "input", "width": 10, "x": 0, "y": 0},
            {"height": 10, "name": "gone", "type": "input", "width": 10, "x": 300, "y": 300},
            {"height": 5, "name": "b", "type": "button", "width": 30, "x": 50, "y": 50},
            {"height": 50, "name": "edge", "type": "select", "width": 50, "x": 90, "y": 95}
        ]
    });
    let response = app.oneshot(json_request("/crop/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let base64s = body["base64s"].as_array().unwrap();
    assert_eq!(base64s.len(), 4);

    let first = decode_png(&base64s[0]);
    assert_eq!((first.width(), first.height()), (10, 20));
    assert_eq!(base64s[1], "");
    let third = decode_png(&base64s[2]);
    assert_eq!((third.width(), third.height()), (30, 5));
    let clamped = decode_png(&base64s[3]);
    assert_eq!((clamped.width(), clamped.height()), (10, 5));
}

#[tokio::test]
async fn test_crop_negative_width_fails_whole_request() {
    let base = serve_image(png_bytes(100, 100)).await;
    let staging = TempDir::new().unwrap();
    let app = crop_app(&staging);

    let body = json!({
        "url": format!("{}/form.png", base),
        "tags": [
            {"height": 10, "name": "ok", "type": "input", "width": 10, "x": 0, "y": 0},
            {"height": 10, "name": "broken", "type": "input", "width": -3, "x": 0, "y": 0}
        ]
    });
    let response = app.oneshot(json_request("/crop/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("broken"));
}

#[tokio::test]
async fn test_crop_unreachable_url_is_500() {
    let staging = TempDir::new().unwrap();
    let app = crop_app(&staging);

    let body = json!({
        "url": "http://unreachable.invalid/form.png",
        "tags": [{"height": 10, "name": "a", "type": "input", "width": 10, "x": 0, "y": 0}]
    });
    let response = app.oneshot(json_request("/crop/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_crop_non_image_source_is_500() {
    let staging = TempDir::new().unwrap();
    let app = crop_app(&staging);
    let base = serve_image(b"<html>not an image</html>".to_vec()).await;

    let body = json!({
        "url": format!("{}/form.png", base),
        "tags": []
    });
    let response = app.oneshot(json_request("/crop/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Failed to decode source image"));
}

#[tokio::test]
async fn test_crop_malformed_body_is_client_error() {
    let staging = TempDir::new().unwrap();
    let app = crop_app(&staging);

    let response = app
        .oneshot(json_request("/crop/", json!({ "url": "http://example.com/a.png" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    let body = body_json(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("tags"), "unexpected detail: {}", detail);
}
