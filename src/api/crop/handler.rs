// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crop endpoint handler

use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use tracing::{debug, info};

use super::request::CropRequest;
use super::response::CropResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /crop/ - Cut tagged regions out of a remote image
///
/// # Request
/// - `url`: image to fetch
/// - `tags`: `{name, type, x, y, width, height}` regions in source pixels
///
/// # Response
/// - `base64s`: one base64 PNG per tag, in tag order. Regions with no
///   pixels inside the image yield `""`.
///
/// # Errors
/// - 4xx: `{detail}` when the body is not a valid crop request
/// - 500 Internal Server Error: `{detail}` when fetching or decoding fails,
///   or when any tag has negative or non-finite geometry
pub async fn crop_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<CropRequest>, ApiError>,
) -> Result<Json<CropResponse>, ApiError> {
    debug!(
        "Crop request received: {} tags from {}",
        request.tags.len(),
        request.url
    );

    let crops = state.pipeline.crop_url(&request.url, request.tags).await?;

    info!("Crop complete: {} regions from {}", crops.len(), request.url);

    Ok(Json(CropResponse::from(crops)))
}
