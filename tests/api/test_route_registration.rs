// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Route Registration tests
//!
//! These tests verify that:
//! - /predict/, /predict, /crop/ and /health are registered with the right methods
//! - Unknown routes are 404
//! - CORS is permissive
//! - /health reports the loaded model

use super::support::*;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

#[tokio::test]
async fn test_health_reports_model() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "mock-detector");
    assert_eq!(body["classes"], CLASS_NAMES.len());
    assert_eq!(body["version"], form_field_detector::version::VERSION_NUMBER);
    assert_eq!(body["build"]["build"], form_field_detector::version::VERSION);
    let features = body["build"]["features"].as_array().unwrap();
    assert!(features.iter().any(|f| f == "region-crop"));
}

#[tokio::test]
async fn test_predict_upload_route_rejects_get() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let response = app.oneshot(get_request("/predict/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_predict_url_route_rejects_post() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_crop_route_rejects_get() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let response = app.oneshot(get_request("/crop/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let response = app.oneshot(get_request("/predict/batch")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let staging = TempDir::new().unwrap();
    let app = app_with(mock_detector(), &staging);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header(header::ORIGIN, "https://forms.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
